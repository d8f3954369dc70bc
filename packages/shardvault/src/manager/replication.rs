//! Replica levels.
//!
//! Level N holds one full copy of every primary, named `<shard>-<N>`.
//! Levels are added on top and removed from the top.

use crate::error::{Result, ShardError};
use crate::storage::{EntryId, IndexStore};

use super::ShardManager;

impl<S: IndexStore> ShardManager<S> {
    /// Add a replication level on top of the current depth.
    ///
    /// Copies every primary present on disk and records the copy with its
    /// primary's range. Returns the new level.
    pub fn add_replication(&mut self) -> Result<u32> {
        self.reload()?;
        let expected = self.index.shard_ids();
        if expected.is_empty() {
            return Err(ShardError::NotSharded);
        }
        let on_disk = self.dir.primaries()?;

        self.replication_depth += 1;
        let level = self.replication_depth;

        for shard in expected {
            if !on_disk.contains(&shard) {
                tracing::warn!("shard {} has no primary file, not replicated", shard);
                continue;
            }
            let replica = EntryId::Replica { shard, level };
            self.dir.copy(&EntryId::Shard(shard), &replica)?;
            self.index.mirror_primary(replica);
            tracing::debug!("created replica {}", replica);
        }

        self.persist()?;
        tracing::info!("added replication level {}", level);
        Ok(level)
    }

    /// Remove the deepest replication level. Returns the removed level.
    ///
    /// Afterwards the depth is re-derived from the remaining replica ids,
    /// so repeated calls walk down one level at a time.
    pub fn remove_replication(&mut self) -> Result<u32> {
        self.reload()?;
        let level = self.replication_depth;
        if level == 0 {
            return Err(ShardError::NothingToRemove);
        }

        let doomed: Vec<EntryId> = self
            .index
            .replica_ids()
            .into_iter()
            .filter(|id| id.level() == level)
            .chain(self.dir.replicas()?.into_iter().filter(|id| id.level() == level))
            .collect();
        for replica in doomed {
            if self.dir.remove(&replica)? {
                tracing::debug!("deleted replica {}", replica);
            }
            self.index.remove(&replica);
        }

        self.replication_depth = self.index.max_replica_level();
        self.persist()?;
        tracing::info!(
            "removed replication level {}: depth now {}",
            level,
            self.replication_depth
        );

        self.sync()?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryIndexStore, ShardDir};
    use tempfile::tempdir;

    fn built_manager(dir: &std::path::Path) -> ShardManager<MemoryIndexStore> {
        let mut manager =
            ShardManager::open(MemoryIndexStore::new(), ShardDir::new(dir, "txt")).unwrap();
        manager.build(3, b"abcdefghij").unwrap();
        manager
    }

    #[test]
    fn test_add_replication_copies_every_primary() {
        let tmp = tempdir().unwrap();
        let mut manager = built_manager(tmp.path());

        assert_eq!(manager.add_replication().unwrap(), 1);
        assert_eq!(manager.replication_depth(), 1);

        for shard in 0..3 {
            let primary = EntryId::Shard(shard);
            let replica = EntryId::Replica { shard, level: 1 };
            let dir = manager.shard_dir();
            assert_eq!(dir.read(&replica).unwrap(), dir.read(&primary).unwrap());
            assert_eq!(
                manager.all_shard_data().get(&replica),
                manager.all_shard_data().get(&primary)
            );
        }
    }

    #[test]
    fn test_add_replication_stacks_levels() {
        let tmp = tempdir().unwrap();
        let mut manager = built_manager(tmp.path());
        manager.add_replication().unwrap();
        manager.add_replication().unwrap();

        assert_eq!(manager.replication_depth(), 2);
        assert_eq!(manager.replica_ids().len(), 6);
        assert!(manager.shard_dir().exists(&EntryId::Replica { shard: 2, level: 2 }));
    }

    #[test]
    fn test_add_replication_without_shards() {
        let tmp = tempdir().unwrap();
        let mut manager =
            ShardManager::open(MemoryIndexStore::new(), ShardDir::new(tmp.path(), "txt"))
                .unwrap();
        assert!(matches!(manager.add_replication(), Err(ShardError::NotSharded)));
        assert_eq!(manager.replication_depth(), 0);
    }

    #[test]
    fn test_remove_replication_deletes_deepest_level_only() {
        let tmp = tempdir().unwrap();
        let mut manager = built_manager(tmp.path());
        manager.add_replication().unwrap();
        manager.add_replication().unwrap();

        assert_eq!(manager.remove_replication().unwrap(), 2);

        assert_eq!(manager.replication_depth(), 1);
        for shard in 0..3 {
            assert!(manager.shard_dir().exists(&EntryId::Replica { shard, level: 1 }));
            assert!(!manager.shard_dir().exists(&EntryId::Replica { shard, level: 2 }));
        }
        assert!(manager.replica_ids().iter().all(|id| id.level() == 1));
    }

    #[test]
    fn test_remove_replication_walks_down_to_nothing() {
        let tmp = tempdir().unwrap();
        let mut manager = built_manager(tmp.path());
        manager.add_replication().unwrap();
        manager.add_replication().unwrap();

        assert_eq!(manager.remove_replication().unwrap(), 2);
        assert_eq!(manager.remove_replication().unwrap(), 1);
        assert!(matches!(
            manager.remove_replication(),
            Err(ShardError::NothingToRemove)
        ));
        assert!(manager.shard_dir().replicas().unwrap().is_empty());
        assert_eq!(manager.shard_ids(), vec![0, 1, 2]);
    }

    #[test]
    fn test_add_after_remove_reuses_level() {
        let tmp = tempdir().unwrap();
        let mut manager = built_manager(tmp.path());
        manager.add_replication().unwrap();
        manager.remove_replication().unwrap();

        assert_eq!(manager.add_replication().unwrap(), 1);
    }
}
