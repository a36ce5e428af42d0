use async_trait::async_trait;
use bytes::Bytes;
use ocs_crypto::DigestCodec;
use ocs_types::{BlobRef, ContentAddress};

use crate::error::{StoreError, StoreResult};

/// Result of a successful `put`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// The payload was written.
    Stored,
    /// Identical bytes were already present; nothing changed.
    AlreadyPresent,
}

/// Reject `payload` unless it hashes to `address`.
pub fn check_address(address: &ContentAddress, payload: &[u8]) -> StoreResult<()> {
    let computed = DigestCodec::address_of(payload);
    if computed != *address {
        return Err(StoreError::AddressMismatch {
            expected: *address,
            computed,
        });
    }
    Ok(())
}

/// Content-addressed store for off-chain content.
///
/// All implementations must satisfy these invariants:
/// - `put` verifies the address before touching storage.
/// - Payloads are immutable once written; `put` of identical bytes is idempotent.
/// - `get` never returns bytes that fail to hash to the requested address.
/// - Concurrent `put`s of the same payload need no external locking.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a payload. Returns `Ok(None)` if absent.
    async fn get(&self, address: &ContentAddress) -> StoreResult<Option<Bytes>>;

    /// Write a payload under its address.
    async fn put(&self, address: &ContentAddress, payload: Bytes) -> StoreResult<PutOutcome>;

    async fn exists(&self, address: &ContentAddress) -> StoreResult<bool>;

    /// Delete a payload. Returns `true` if it existed.
    ///
    /// Intended for external garbage collection only.
    async fn delete(&self, address: &ContentAddress) -> StoreResult<bool>;

    /// Read a payload that must exist and fit within `max_size`.
    async fn get_bounded(
        &self,
        address: &ContentAddress,
        max_size: Option<u64>,
    ) -> StoreResult<Bytes> {
        let payload = self
            .get(address)
            .await?
            .ok_or_else(|| StoreError::NotFound(address.to_string()))?;
        if let Some(max) = max_size {
            let size = payload.len() as u64;
            if size > max {
                return Err(StoreError::TooLarge {
                    reference: address.to_string(),
                    size,
                    max,
                });
            }
        }
        Ok(payload)
    }
}

/// Interface of the external binary blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob, failing with `NotFound` or `TooLarge`.
    async fn get(&self, blob: &BlobRef, max_size: Option<u64>) -> StoreResult<Bytes>;

    /// Add a blob and return its reference.
    async fn add(&self, bytes: Bytes) -> StoreResult<BlobRef>;

    async fn has(&self, blob: &BlobRef) -> StoreResult<bool>;
}
