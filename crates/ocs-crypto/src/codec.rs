use ocs_types::{is_content_address, BlobRef, ContentAddress};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Computes and checks content addresses.
pub struct DigestCodec;

impl DigestCodec {
    /// Address of a payload. Same bytes always produce the same address.
    pub fn address_of(bytes: &[u8]) -> ContentAddress {
        ContentAddress::from_digest(Self::sha256(bytes))
    }

    /// Blob-store reference for raw bytes.
    pub fn blob_ref_of(bytes: &[u8]) -> BlobRef {
        BlobRef::from_digest(Self::sha256(bytes))
    }

    /// Returns `true` iff `token` has the content-address format.
    pub fn looks_like_address(token: &str) -> bool {
        is_content_address(token)
    }

    /// Verify that `bytes` hash to `expected`.
    pub fn verify(bytes: &[u8], expected: &ContentAddress) -> bool {
        Self::address_of(bytes) == *expected
    }

    /// Canonical bytes of a serializable value.
    ///
    /// The value is first lowered to a `serde_json::Value`, whose maps are
    /// key-sorted, then encoded compactly. Two values that are equal as JSON
    /// always encode to the same bytes regardless of field order in the
    /// source type.
    pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
        let tree = serde_json::to_value(value).map_err(|e| CodecError::Serialization(e.to_string()))?;
        serde_json::to_vec(&tree).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Canonical bytes plus their address.
    pub fn encode<T: Serialize + ?Sized>(
        value: &T,
    ) -> Result<(ContentAddress, Vec<u8>), CodecError> {
        let bytes = Self::canonical_json(value)?;
        Ok((Self::address_of(&bytes), bytes))
    }

    fn sha256(bytes: &[u8]) -> [u8; 32] {
        Sha256::digest(bytes).into()
    }
}

/// Errors from encoding operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
