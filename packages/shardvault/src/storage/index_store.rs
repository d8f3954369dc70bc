//! Persistence for the shard index.
//!
//! `IndexStore` is the seam between the managers and whatever holds the
//! index. `JsonIndexStore` keeps it in a single JSON file; the in-memory
//! store backs tests that only care about manager logic.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::error::Result;
use crate::storage::index::Index;

/// Load/save access to the persisted index.
pub trait IndexStore {
    /// Load the index, or an empty one if nothing has been persisted yet.
    fn load(&self) -> Result<Index>;

    /// Replace the persisted index. Readers never observe a partial write.
    fn save(&mut self, index: &Index) -> Result<()>;
}

// ── JSON file store ─────────────────────────────────────────────────

/// Index persisted as a pretty-printed JSON object.
#[derive(Debug, Clone)]
pub struct JsonIndexStore {
    path: PathBuf,
}

impl JsonIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index".to_string());
        self.path
            .with_file_name(format!("{}.{}.tmp", name, std::process::id()))
    }
}

impl IndexStore for JsonIndexStore {
    fn load(&self) -> Result<Index> {
        if !self.path.exists() {
            return Ok(Index::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let index: Index = serde_json::from_str(&contents)?;
        tracing::debug!("loaded {} index entries from {:?}", index.len(), self.path);
        Ok(index)
    }

    fn save(&mut self, index: &Index) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(index)?;
        let temp_path = self.temp_path();
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        tracing::debug!("saved {} index entries to {:?}", index.len(), self.path);
        Ok(())
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Index held in memory only. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndexStore {
    index: Index,
    saves: usize,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-populated index.
    pub fn with_index(index: Index) -> Self {
        Self { index, saves: 0 }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl IndexStore for MemoryIndexStore {
    fn load(&self) -> Result<Index> {
        Ok(self.index.clone())
    }

    fn save(&mut self, index: &Index) -> Result<()> {
        self.index = index.clone();
        self.saves += 1;
        Ok(())
    }
}
