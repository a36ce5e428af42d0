use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Author identity of a single feed.
///
/// A `FeedId` is derived from an author's public key (or any 32 bytes of
/// seed material) with domain-separated BLAKE3. Key management and signing
/// are the log's concern; here the id is only a stable name for a feed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedId([u8; 32]);

impl FeedId {
    /// Derive a feed identity from an author's public key bytes.
    pub fn from_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ocs-feed-v1:");
        hasher.update(public_key);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a random feed identity for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::from_public_key(&bytes)
    }

    /// Create from a raw 32-byte id. Use `from_public_key()` for production code.
    pub fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (`@` and the first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("@{}", hex::encode(&self.0[..4]))
    }

    /// Parse from 64 hex characters, with or without a leading `@`.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix('@').unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.short_id())
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.to_hex())
    }
}
