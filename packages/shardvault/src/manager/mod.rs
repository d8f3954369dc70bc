//! Shard lifecycle manager.
//!
//! Owns the index, the shard directory and the replication depth, and
//! keeps them in lockstep:
//!
//! - `build()`, `add_shard()`, `remove_shard()`: split and rebalance
//!   the dataset across primary files (see `sharding`)
//! - `add_replication()`, `remove_replication()`: full-copy replica levels
//!   (see `replication`)
//! - `sync()`: repair drift between index, primaries and replicas
//!   (see `reconcile`)
//!
//! Every mutator persists the index before returning. Operations are
//! synchronous and assume a single writer; callers serialize access.

mod reconcile;
mod replication;
mod sharding;

pub use reconcile::SyncReport;

use crate::config::StoreConfig;
use crate::error::{Result, ShardError};
use crate::storage::{ByteRange, EntryId, Index, IndexStore, JsonIndexStore, ShardDir};

/// Shard/replica manager over an index store and a shard directory.
pub struct ShardManager<S: IndexStore = JsonIndexStore> {
    store: S,
    dir: ShardDir,
    index: Index,
    /// Highest replication level in use.
    replication_depth: u32,
}

// ── Constructors ───────────────────────────────────────────────────

impl ShardManager<JsonIndexStore> {
    /// Open the store described by `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(
            JsonIndexStore::new(&config.index_path),
            ShardDir::new(&config.shard_dir, &config.extension),
        )
    }
}

impl<S: IndexStore> ShardManager<S> {
    /// Load the index and derive the replication depth from its replica ids.
    ///
    /// Touches no shard files.
    pub fn open(store: S, dir: ShardDir) -> Result<Self> {
        let index = store.load()?;
        let replication_depth = index.max_replica_level();
        tracing::debug!(
            "opened shard manager: {} entries, replication depth {}",
            index.len(),
            replication_depth
        );
        Ok(Self {
            store,
            dir,
            index,
            replication_depth,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn shard_dir(&self) -> &ShardDir {
        &self.dir
    }

    /// Re-read the index from the store and re-derive the depth.
    fn reload(&mut self) -> Result<()> {
        self.index = self.store.load()?;
        self.replication_depth = self.index.max_replica_level();
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.index)
    }
}

// ── Queries ────────────────────────────────────────────────────────

impl<S: IndexStore> ShardManager<S> {
    pub fn replication_depth(&self) -> u32 {
        self.replication_depth
    }

    /// Primary shard ids, ascending.
    pub fn shard_ids(&self) -> Vec<u32> {
        self.index.shard_ids()
    }

    /// Replica ids, grouped by shard then level.
    pub fn replica_ids(&self) -> Vec<EntryId> {
        self.index.replica_ids()
    }

    /// Byte range of a single shard or replica, by id string.
    ///
    /// Unknown or malformed ids yield `InvalidShardId` listing the valid
    /// shard ids.
    pub fn shard_data(&self, id: &str) -> Result<(EntryId, ByteRange)> {
        id.parse::<EntryId>()
            .ok()
            .and_then(|entry| self.index.get(&entry).map(|range| (entry, *range)))
            .ok_or_else(|| ShardError::InvalidShardId {
                id: id.to_string(),
                valid: self.shard_ids(),
            })
    }

    /// The whole index.
    pub fn all_shard_data(&self) -> &Index {
        &self.index
    }

    /// Concatenate primary shard files in id order.
    ///
    /// A primary listed in the index without a file is a fatal I/O error.
    pub fn reconstruct(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        for shard in self.index.shard_ids() {
            let id = EntryId::Shard(shard);
            let bytes = self.dir.read(&id).map_err(|e| {
                tracing::error!("cannot read primary shard {}: {}", id, e);
                e
            })?;
            data.extend_from_slice(&bytes);
        }
        Ok(data)
    }
}
