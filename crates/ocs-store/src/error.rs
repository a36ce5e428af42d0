use ocs_types::ContentAddress;

/// Errors from payload store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested payload was not found.
    #[error("payload not found: {0}")]
    NotFound(String),

    /// The payload exists but exceeds the caller's size bound.
    #[error("payload {reference} is {size} bytes, exceeding the {max} byte limit")]
    TooLarge {
        reference: String,
        size: u64,
        max: u64,
    },

    /// A write was attempted under an address its bytes do not hash to.
    #[error("address mismatch: expected {expected}, computed {computed}")]
    AddressMismatch {
        expected: ContentAddress,
        computed: ContentAddress,
    },

    /// Stored bytes no longer hash to their address (data corruption).
    #[error("hash mismatch for {address}: stored bytes hash to {computed}")]
    HashMismatch {
        address: ContentAddress,
        computed: ContentAddress,
    },

    /// Different bytes are already stored under this address.
    #[error("conflicting payload already stored under {0}")]
    Conflict(ContentAddress),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Fetch failures a best-effort reader may skip over.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::TooLarge { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
