use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid base64 digest: {0}")]
    InvalidBase64(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("not a content address: {0}")]
    NotAContentAddress(String),

    #[error("not a blob reference: {0}")]
    NotABlobRef(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
