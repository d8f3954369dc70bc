//! Store configuration.
//!
//! Names where the index lives and where shard files are written. Can be
//! persisted as JSON next to the data and read back on every open.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default index file name.
pub const DEFAULT_INDEX_PATH: &str = "mapping.json";

/// Default shard directory.
pub const DEFAULT_SHARD_DIR: &str = "data";

/// Default shard file extension.
pub const DEFAULT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON index file.
    pub index_path: PathBuf,
    /// Directory holding primary and replica files.
    pub shard_dir: PathBuf,
    /// Extension of shard files, without the dot.
    pub extension: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(DEFAULT_INDEX_PATH),
            shard_dir: PathBuf::from(DEFAULT_SHARD_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at `base`: `<base>/mapping.json` and `<base>/data/`.
    pub fn in_dir(base: &Path) -> Self {
        Self {
            index_path: base.join(DEFAULT_INDEX_PATH),
            shard_dir: base.join(DEFAULT_SHARD_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Read config from a JSON file. Returns None if the file doesn't exist.
    pub fn read_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(Some(config))
    }

    /// Write config to a JSON file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
