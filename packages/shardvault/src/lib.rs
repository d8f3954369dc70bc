//! shardvault: splits a dataset into contiguous shard files, keeps
//! full-copy replicas at increasing replication levels, and maintains a
//! persisted index from shard/replica id to byte range.
//!
//! ```no_run
//! use shardvault::{ShardManager, StoreConfig};
//!
//! let config = StoreConfig::default();
//! let mut manager = ShardManager::from_config(&config).unwrap();
//!
//! manager.build(5, b"some text to shard").unwrap();
//! manager.add_replication().unwrap();
//! manager.add_shard().unwrap();
//!
//! let report = manager.sync().unwrap();
//! assert!(report.is_clean());
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod manager;
pub mod storage;

pub use config::StoreConfig;
pub use error::{Result, ShardError};
pub use manager::{ShardManager, SyncReport};
pub use storage::{ByteRange, EntryId, Index, IndexStore, JsonIndexStore, MemoryIndexStore, ShardDir};
