use ocs_types::FeedId;

/// Errors produced by log operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("hash collision detected")]
    HashCollision,

    #[error("feed not found: {0}")]
    FeedNotFound(FeedId),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("log unavailable: {0}")]
    Unavailable(String),
}

pub type LogResult<T> = Result<T, LogError>;
