use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::identity::FeedId;
use crate::reference::ContentAddress;

/// Hash-link identifier of a log entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey([u8; 32]);

impl EntryKey {
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryKey(%{})", self.short_hex())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.to_hex())
    }
}

/// Fields covered by an entry's key.
#[derive(Serialize)]
struct KeyedFields<'a> {
    author: &'a FeedId,
    seq: u64,
    previous: &'a Option<EntryKey>,
    timestamp_ms: u64,
    body: &'a Value,
}

/// One immutable record of a feed.
///
/// The body is an arbitrary JSON tree. Entries published through the
/// off-chain pipeline carry a bare [`ContentAddress`] string as their body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: EntryKey,
    pub author: FeedId,
    pub seq: u64,
    pub previous: Option<EntryKey>,
    pub timestamp_ms: u64,
    pub body: Value,
}

impl Entry {
    /// Build an entry and compute its key from the remaining fields.
    pub fn new(
        author: FeedId,
        seq: u64,
        previous: Option<EntryKey>,
        timestamp_ms: u64,
        body: Value,
    ) -> Result<Self, TypeError> {
        let key = Self::compute_key(&author, seq, &previous, timestamp_ms, &body)?;
        Ok(Self {
            key,
            author,
            seq,
            previous,
            timestamp_ms,
            body,
        })
    }

    /// BLAKE3 over the JSON encoding of everything except the key itself.
    pub fn compute_key(
        author: &FeedId,
        seq: u64,
        previous: &Option<EntryKey>,
        timestamp_ms: u64,
        body: &Value,
    ) -> Result<EntryKey, TypeError> {
        let fields = KeyedFields {
            author,
            seq,
            previous,
            timestamp_ms,
            body,
        };
        let bytes =
            serde_json::to_vec(&fields).map_err(|e| TypeError::Serialization(e.to_string()))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"ocs-entry-v1:");
        hasher.update(&bytes);
        Ok(EntryKey(*hasher.finalize().as_bytes()))
    }

    /// Recompute the key and compare it with the stored one.
    pub fn verify_key(&self) -> Result<bool, TypeError> {
        let computed = Self::compute_key(
            &self.author,
            self.seq,
            &self.previous,
            self.timestamp_ms,
            &self.body,
        )?;
        Ok(computed == self.key)
    }

    /// The content address this entry stands for, if its body is one.
    pub fn content_address(&self) -> Option<ContentAddress> {
        self.body
            .as_str()
            .and_then(|token| ContentAddress::parse(token).ok())
    }
}

/// An entry together with its resolved off-chain content.
///
/// This is a transient copy for delivery; the log's entry is never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEntry {
    pub entry: Entry,
    pub content: Option<Value>,
}

impl ResolvedEntry {
    pub fn unresolved(entry: Entry) -> Self {
        Self {
            entry,
            content: None,
        }
    }
}
