use ocs_crypto::CodecError;
use ocs_log::LogError;
use ocs_store::StoreError;
use ocs_types::{ContentAddress, EntryKey};

/// Errors that terminate a stream pass or a publish call.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// An entry named content that was neither pending nor already
    /// reconciled in this pass.
    #[error("entries from the content stream must contain content: entry {entry} references {address}")]
    MissingDependency {
        entry: EntryKey,
        address: ContentAddress,
    },

    /// Payloads were still pending when the upstream ended.
    #[error("{} payload(s) arrived without a referencing entry", .addresses.len())]
    UnmatchedPayloads { addresses: Vec<ContentAddress> },

    /// Stored content is not valid JSON.
    #[error("cannot decode content {address}: {reason}")]
    Decode {
        address: ContentAddress,
        reason: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("log error: {0}")]
    Log(#[from] LogError),
}

impl From<CodecError> for StreamError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Serialization(reason) => Self::Serialization(reason),
        }
    }
}

pub type StreamResult<T> = Result<T, StreamError>;

/// Errors from loading a [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
