//! Filesystem-backed content store.
//!
//! Layout mirrors git's loose objects: the hex digest of an address is split
//! into a two-character fan-out directory and a file name.
//!
//! ```text
//! <root>/ab/cdef0123...   (62 hex chars, raw payload bytes)
//! ```
//!
//! Writes go to a uniquely named temporary file in the fan-out directory and
//! are then renamed into place, so a reader never observes a partial payload
//! under its final name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use ocs_crypto::DigestCodec;
use ocs_types::ContentAddress;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{check_address, ContentStore, PutOutcome};

/// Durable content store rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open (or create) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, address: &ContentAddress) -> PathBuf {
        let hex = address.to_hex();
        let (fan_out, name) = hex.split_at(2);
        self.root.join(fan_out).join(name)
    }

    async fn read_verified(
        &self,
        address: &ContentAddress,
        path: &Path,
    ) -> StoreResult<Option<Bytes>> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let computed = DigestCodec::address_of(&bytes);
        if computed != *address {
            warn!(address = %address, path = %path.display(), "stored payload fails hash check");
            return Err(StoreError::HashMismatch {
                address: *address,
                computed,
            });
        }
        Ok(Some(bytes))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn get(&self, address: &ContentAddress) -> StoreResult<Option<Bytes>> {
        let path = self.path_for(address);
        self.read_verified(address, &path).await
    }

    async fn put(&self, address: &ContentAddress, payload: Bytes) -> StoreResult<PutOutcome> {
        check_address(address, &payload)?;
        let path = self.path_for(address);

        match tokio::fs::read(&path).await {
            Ok(existing) if existing == payload.as_ref() => {
                return Ok(PutOutcome::AlreadyPresent);
            }
            Ok(_) => return Err(StoreError::Conflict(*address)),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::now_v7().simple()));
        tokio::fs::write(&tmp, &payload).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(address = %address, bytes = payload.len(), "stored payload");
        Ok(PutOutcome::Stored)
    }

    async fn exists(&self, address: &ContentAddress) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(address)).await?)
    }

    async fn delete(&self, address: &ContentAddress) -> StoreResult<bool> {
        match tokio::fs::remove_file(self.path_for(address)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
