//! Index types: entry identifiers and the byte ranges they map to.
//!
//! The index is a flat mapping from id string to `{start, end}`:
//!
//! ```text
//! {
//!   "0":   { "start": 0, "end": 4 },
//!   "0-1": { "start": 0, "end": 4 },
//!   "1":   { "start": 5, "end": 7 }
//! }
//! ```
//!
//! Ids without the separator are primary shards, ids with exactly one
//! separator are replicas `<shard>-<level>`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ShardError;

/// Separator between shard id and replication level in replica ids.
pub const REPLICA_SEPARATOR: char = '-';

// ── Entry Id ────────────────────────────────────────────────────────

/// Identifier of a primary shard or one of its replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryId {
    /// Primary shard file.
    Shard(u32),
    /// Full copy of `shard` at replication `level` (always >= 1).
    Replica { shard: u32, level: u32 },
}

impl EntryId {
    /// Shard this entry belongs to (itself for primaries).
    pub fn shard(&self) -> u32 {
        match *self {
            EntryId::Shard(id) => id,
            EntryId::Replica { shard, .. } => shard,
        }
    }

    /// Replication level, 0 for primaries.
    pub fn level(&self) -> u32 {
        match *self {
            EntryId::Shard(_) => 0,
            EntryId::Replica { level, .. } => level,
        }
    }

    pub fn is_replica(&self) -> bool {
        matches!(self, EntryId::Replica { .. })
    }

    /// The primary this entry copies (itself for primaries).
    pub fn primary(&self) -> EntryId {
        EntryId::Shard(self.shard())
    }
}

// Primary first, then its replicas by level, then the next shard.
impl Ord for EntryId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.shard(), self.level()).cmp(&(other.shard(), other.level()))
    }
}

impl PartialOrd for EntryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Shard(id) => write!(f, "{}", id),
            EntryId::Replica { shard, level } => {
                write!(f, "{}{}{}", shard, REPLICA_SEPARATOR, level)
            }
        }
    }
}

impl FromStr for EntryId {
    type Err = ShardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShardError::InvalidEntryId(s.to_string());
        let parse_num = |part: &str| -> Result<u32, ShardError> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        };

        let id = match s.split_once(REPLICA_SEPARATOR) {
            None => EntryId::Shard(parse_num(s)?),
            Some((shard, level)) => {
                let level = parse_num(level)?;
                if level == 0 {
                    return Err(invalid());
                }
                EntryId::Replica { shard: parse_num(shard)?, level }
            }
        };

        // Reject non-canonical spellings ("007", "1-01") so each file maps to one id
        if id.to_string() != s {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// ── Byte Range ──────────────────────────────────────────────────────

/// Offsets within the logical dataset that an entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

// ── Index ───────────────────────────────────────────────────────────

/// Mapping from shard/replica id to byte range.
///
/// Performs no invariant checks; drift between the index and the shard
/// directory is repaired by `ShardManager::sync`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index {
    entries: BTreeMap<EntryId, ByteRange>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, id: &EntryId) -> Option<&ByteRange> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: EntryId, range: ByteRange) -> Option<ByteRange> {
        self.entries.insert(id, range)
    }

    pub fn remove(&mut self, id: &EntryId) -> Option<ByteRange> {
        self.entries.remove(id)
    }

    /// Iterate entries in id order (shard, then level).
    pub fn iter(&self) -> impl Iterator<Item = (&EntryId, &ByteRange)> {
        self.entries.iter()
    }

    /// Primary shard ids in ascending numeric order.
    pub fn shard_ids(&self) -> Vec<u32> {
        self.entries
            .keys()
            .filter_map(|id| match id {
                EntryId::Shard(shard) => Some(*shard),
                EntryId::Replica { .. } => None,
            })
            .collect()
    }

    /// Replica ids ordered by shard, then level.
    pub fn replica_ids(&self) -> Vec<EntryId> {
        self.entries.keys().filter(|id| id.is_replica()).copied().collect()
    }

    pub fn max_shard_id(&self) -> Option<u32> {
        self.shard_ids().into_iter().max()
    }

    /// Highest replication level present, 0 if there are no replicas.
    pub fn max_replica_level(&self) -> u32 {
        self.entries.keys().map(EntryId::level).max().unwrap_or(0)
    }

    /// Replace primary entries `0..lengths.len()` with consecutive ranges.
    ///
    /// Shard 0 starts at 0; every later shard starts one past the running
    /// byte count (`end + 1` of its predecessor). Entries for shards beyond
    /// `lengths.len()` are left untouched.
    pub fn assign_primary_ranges(&mut self, lengths: &[usize]) {
        let mut cursor: u64 = 0;
        for (shard, len) in lengths.iter().enumerate() {
            let len = *len as u64;
            let start = if cursor == 0 { 0 } else { cursor + 1 };
            let range = ByteRange { start, end: cursor + len };
            self.entries.insert(EntryId::Shard(shard as u32), range);
            cursor += len;
        }
    }

    /// Point `replica` at a copy of its primary's current range.
    ///
    /// Returns the copied range, or None if the primary has no entry.
    pub fn mirror_primary(&mut self, replica: EntryId) -> Option<ByteRange> {
        let range = *self.entries.get(&replica.primary())?;
        self.entries.insert(replica, range);
        Some(range)
    }

    /// Remove a shard's primary entry together with all of its replicas.
    pub fn remove_shard(&mut self, shard: u32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| id.shard() != shard);
        before - self.entries.len()
    }
}
