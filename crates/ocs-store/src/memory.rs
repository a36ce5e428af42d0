use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use ocs_crypto::DigestCodec;
use ocs_types::{BlobRef, ContentAddress};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_address, BlobStore, ContentStore, PutOutcome};

// ---------------------------------------------------------------------------
// InMemoryContentStore
// ---------------------------------------------------------------------------

/// In-memory, HashMap-based content store.
///
/// Intended for tests and embedding. `Bytes` clones are reference-counted, so
/// reads do not copy payloads.
pub struct InMemoryContentStore {
    payloads: RwLock<HashMap<ContentAddress, Bytes>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.payloads
            .read()
            .expect("lock poisoned")
            .values()
            .map(|p| p.len() as u64)
            .sum()
    }

    /// Sorted list of all stored addresses.
    pub fn addresses(&self) -> Vec<ContentAddress> {
        let map = self.payloads.read().expect("lock poisoned");
        let mut addresses: Vec<ContentAddress> = map.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Bypass address checks; lets tests simulate on-disk corruption.
    #[cfg(test)]
    fn insert_unchecked(&self, address: ContentAddress, payload: Bytes) {
        self.payloads
            .write()
            .expect("lock poisoned")
            .insert(address, payload);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn get(&self, address: &ContentAddress) -> StoreResult<Option<Bytes>> {
        let payload = self
            .payloads
            .read()
            .expect("lock poisoned")
            .get(address)
            .cloned();
        if let Some(bytes) = &payload {
            let computed = DigestCodec::address_of(bytes);
            if computed != *address {
                return Err(StoreError::HashMismatch {
                    address: *address,
                    computed,
                });
            }
        }
        Ok(payload)
    }

    async fn put(&self, address: &ContentAddress, payload: Bytes) -> StoreResult<PutOutcome> {
        check_address(address, &payload)?;
        let mut map = self.payloads.write().expect("lock poisoned");
        match map.entry(*address) {
            MapEntry::Occupied(existing) if *existing.get() == payload => {
                Ok(PutOutcome::AlreadyPresent)
            }
            MapEntry::Occupied(_) => Err(StoreError::Conflict(*address)),
            MapEntry::Vacant(slot) => {
                slot.insert(payload);
                Ok(PutOutcome::Stored)
            }
        }
    }

    async fn exists(&self, address: &ContentAddress) -> StoreResult<bool> {
        Ok(self
            .payloads
            .read()
            .expect("lock poisoned")
            .contains_key(address))
    }

    async fn delete(&self, address: &ContentAddress) -> StoreResult<bool> {
        Ok(self
            .payloads
            .write()
            .expect("lock poisoned")
            .remove(address)
            .is_some())
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("payload_count", &self.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// InMemoryBlobStore
// ---------------------------------------------------------------------------

/// In-memory blob store keyed by sha256 blob reference.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobRef, Bytes>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, blob: &BlobRef, max_size: Option<u64>) -> StoreResult<Bytes> {
        let bytes = self
            .blobs
            .read()
            .expect("lock poisoned")
            .get(blob)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(blob.to_string()))?;
        if let Some(max) = max_size {
            let size = bytes.len() as u64;
            if size > max {
                return Err(StoreError::TooLarge {
                    reference: blob.to_string(),
                    size,
                    max,
                });
            }
        }
        Ok(bytes)
    }

    async fn add(&self, bytes: Bytes) -> StoreResult<BlobRef> {
        let blob = DigestCodec::blob_ref_of(&bytes);
        self.blobs
            .write()
            .expect("lock poisoned")
            .entry(blob)
            .or_insert(bytes);
        Ok(blob)
    }

    async fn has(&self, blob: &BlobRef) -> StoreResult<bool> {
        Ok(self.blobs.read().expect("lock poisoned").contains_key(blob))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
