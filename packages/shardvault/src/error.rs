//! Error types for the shard store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShardError>;

#[derive(Error, Debug)]
pub enum ShardError {
    #[error("Cannot build shard setup: sharding already exists")]
    AlreadySharded,

    #[error("Invalid shard ID '{id}'. Valid shard IDs: {valid:?}")]
    InvalidShardId { id: String, valid: Vec<u32> },

    #[error("No replication level left to remove")]
    NothingToRemove,

    #[error("No shards exist yet")]
    NotSharded,

    #[error("Cannot split {len} bytes into {requested} shards")]
    InvalidShardCount { requested: usize, len: usize },

    #[error("Invalid entry id: {0}")]
    InvalidEntryId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShardError {
    /// Stable error code, printed by the CLI on failure
    pub fn code(&self) -> &'static str {
        match self {
            ShardError::AlreadySharded => "ALREADY_SHARDED",
            ShardError::InvalidShardId { .. } => "INVALID_SHARD_ID",
            ShardError::NothingToRemove => "NOTHING_TO_REMOVE",
            ShardError::NotSharded => "NOT_SHARDED",
            ShardError::InvalidShardCount { .. } => "INVALID_SHARD_COUNT",
            ShardError::InvalidEntryId(_) => "INVALID_ENTRY_ID",
            ShardError::Io(_) => "IO_ERROR",
            ShardError::Json(_) => "INDEX_FORMAT_ERROR",
        }
    }

    /// True for failures the caller can recover from by issuing a different request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShardError::InvalidShardId { .. } | ShardError::InvalidEntryId(_)
        )
    }
}
