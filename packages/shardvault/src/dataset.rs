//! Loading the source dataset handed to `ShardManager::build`.

use std::path::Path;

use crate::error::Result;

/// Read an entire file as the dataset.
pub fn load_from_file(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path)?;
    tracing::debug!("loaded {} bytes of dataset from {:?}", data.len(), path);
    Ok(data)
}
