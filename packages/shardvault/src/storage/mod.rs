//! Storage primitives: index types, index persistence, the splitter and
//! the shard directory layout.
//!
//! Nothing here enforces cross-component invariants; that is the job of
//! `ShardManager`.

pub mod index;
pub mod index_store;
pub mod shard_dir;
pub mod splitter;

pub use index::{ByteRange, EntryId, Index, REPLICA_SEPARATOR};
pub use index_store::{IndexStore, JsonIndexStore, MemoryIndexStore};
pub use shard_dir::ShardDir;
pub use splitter::split;
