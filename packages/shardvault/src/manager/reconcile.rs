//! Reconciliation between the index, primary files and replicas.
//!
//! Two phases, always in this order:
//!
//! 1. Primary repair: every primary the index expects but that is missing
//!    on disk is copied back from its replica at the deepest level.
//! 2. Replica repair: every replica file whose size differs from its
//!    primary is deleted and copied again from the primary.
//!
//! Primaries are healed before they are used as the source of truth for
//! replicas. Only size drift is detected; there is no content checksum,
//! so a corrupt deepest replica is propagated into a restored primary.

use std::collections::HashSet;

use crate::error::Result;
use crate::storage::{EntryId, IndexStore};

use super::ShardManager;

/// Repairs performed by one `sync()` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Primaries copied back from a replica.
    pub restored_primaries: Vec<u32>,
    /// Replicas recreated from their primary.
    pub rebuilt_replicas: Vec<EntryId>,
}

impl SyncReport {
    /// True when nothing needed repair.
    pub fn is_clean(&self) -> bool {
        self.restored_primaries.is_empty() && self.rebuilt_replicas.is_empty()
    }
}

impl<S: IndexStore> ShardManager<S> {
    /// Repair drift between the index, primaries and replicas.
    ///
    /// Without replica ids in the index there is nothing to recover from
    /// and the call does nothing. Idempotent.
    pub fn sync(&mut self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        if self.index.replica_ids().is_empty() {
            tracing::debug!("sync: no replicas, nothing to reconcile");
            return Ok(report);
        }

        self.restore_primaries(&mut report)?;
        if self.rebuild_replicas(&mut report)? {
            self.persist()?;
        }

        if !report.is_clean() {
            tracing::info!(
                "sync: restored {} primaries, rebuilt {} replicas",
                report.restored_primaries.len(),
                report.rebuilt_replicas.len()
            );
        }
        Ok(report)
    }

    fn restore_primaries(&mut self, report: &mut SyncReport) -> Result<()> {
        let level = self.index.max_replica_level();
        let on_disk: HashSet<u32> = self.dir.primaries()?.into_iter().collect();

        for shard in self.index.shard_ids() {
            if on_disk.contains(&shard) {
                continue;
            }
            let source = EntryId::Replica { shard, level };
            self.dir.copy(&source, &EntryId::Shard(shard)).map_err(|e| {
                tracing::error!("cannot restore primary {} from {}: {}", shard, source, e);
                e
            })?;
            tracing::warn!("restored primary {} from replica {}", shard, source);
            report.restored_primaries.push(shard);
        }
        Ok(())
    }

    /// Returns true if any index entry changed.
    fn rebuild_replicas(&mut self, report: &mut SyncReport) -> Result<bool> {
        let mut index_changed = false;

        for replica in self.dir.replicas()? {
            let primary = replica.primary();
            if !self.index.contains(&primary) {
                tracing::warn!("skipping replica file {} of unknown shard", replica);
                continue;
            }
            // Stray files never enter the index; levels stay gap-free
            if !self.index.contains(&replica) {
                tracing::warn!("skipping replica file {} with no index entry", replica);
                continue;
            }

            let primary_size = self.dir.size(&primary)?;
            let replica_size = self.dir.size(&replica)?;
            if primary_size == replica_size {
                continue;
            }

            self.dir.remove(&replica)?;
            self.dir.copy(&primary, &replica)?;
            if self.index.get(&replica) != self.index.get(&primary) {
                self.index.mirror_primary(replica);
                index_changed = true;
            }
            tracing::warn!(
                "rebuilt replica {} ({} bytes, primary has {})",
                replica,
                replica_size,
                primary_size
            );
            report.rebuilt_replicas.push(replica);
        }
        Ok(index_changed)
    }
}
