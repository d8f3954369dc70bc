//! Building and rebalancing primary shards.
//!
//! Rebalancing always re-splits the whole dataset and rewrites every
//! primary file, so most shards change their byte range on add/remove,
//! not only the boundary shard.

use crate::error::{Result, ShardError};
use crate::storage::{split, EntryId, IndexStore};

use super::ShardManager;

impl<S: IndexStore> ShardManager<S> {
    /// Split `data` into `count` primary shards.
    ///
    /// Fails with `AlreadySharded` if the index has any entry; nothing on
    /// disk or in the index changes in that case.
    pub fn build(&mut self, count: usize, data: &[u8]) -> Result<()> {
        self.reload()?;
        if !self.index.is_empty() {
            return Err(ShardError::AlreadySharded);
        }

        let pieces = split(data, count)?;
        self.write_primaries(&pieces)?;
        self.persist()?;

        tracing::info!("built {} shards from {} bytes", count, data.len());
        Ok(())
    }

    /// Rebalance the dataset across one more shard.
    ///
    /// The new shard gets replicas at every existing level; stale replicas
    /// of the other shards are rebuilt by the closing `sync()`.
    pub fn add_shard(&mut self) -> Result<()> {
        self.reload()?;
        let max_id = self.index.max_shard_id().ok_or(ShardError::NotSharded)?;
        let data = self.reconstruct()?;

        let new_count = max_id as usize + 2;
        let pieces = split(&data, new_count)?;
        self.write_primaries(&pieces)?;

        let new_shard = EntryId::Shard(max_id + 1);
        for level in 1..=self.replication_depth {
            let replica = EntryId::Replica { shard: max_id + 1, level };
            self.dir.copy(&new_shard, &replica)?;
            self.index.mirror_primary(replica);
            tracing::debug!("replicated new shard to {}", replica);
        }

        self.persist()?;
        tracing::info!("added shard {}: now {} shards", new_shard, new_count);

        self.sync()?;
        Ok(())
    }

    /// Rebalance the dataset across one fewer shard.
    ///
    /// Deletes the highest shard with all of its replicas. The last
    /// remaining shard cannot be removed.
    pub fn remove_shard(&mut self) -> Result<()> {
        self.reload()?;
        let max_id = self.index.max_shard_id().ok_or(ShardError::NotSharded)?;
        let data = self.reconstruct()?;

        let new_count = max_id as usize;
        let pieces = split(&data, new_count)?;

        let removed = EntryId::Shard(max_id);
        self.dir.remove(&removed)?;
        for replica in self.dir.replicas()? {
            if replica.shard() == max_id {
                self.dir.remove(&replica)?;
                tracing::debug!("deleted replica {}", replica);
            }
        }
        self.index.remove_shard(max_id);

        self.write_primaries(&pieces)?;
        self.persist()?;
        tracing::info!("removed shard {}: now {} shards", removed, new_count);

        self.sync()?;
        Ok(())
    }

    /// Overwrite primaries `0..pieces.len()` and their index ranges.
    fn write_primaries(&mut self, pieces: &[&[u8]]) -> Result<()> {
        for (shard, piece) in pieces.iter().enumerate() {
            self.dir.write(&EntryId::Shard(shard as u32), piece)?;
        }
        let lengths: Vec<usize> = pieces.iter().map(|p| p.len()).collect();
        self.index.assign_primary_ranges(&lengths);
        Ok(())
    }
}
