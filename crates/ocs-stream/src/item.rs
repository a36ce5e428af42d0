use bytes::Bytes;
use futures::stream::BoxStream;
use ocs_types::{Entry, ResolvedEntry};

use crate::error::StreamResult;

/// One element of a dependency-first merged stream.
///
/// Payloads carry no label; consumers recompute their address from the bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamItem {
    Payload(Bytes),
    Entry(Entry),
}

impl StreamItem {
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Payload(_))
    }

    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Payload(_) => None,
        }
    }
}

/// Merged payloads-then-entries stream.
pub type ItemStream = BoxStream<'static, StreamResult<StreamItem>>;

/// Entries after a stage has consumed the payloads.
pub type EntryResultStream = BoxStream<'static, StreamResult<Entry>>;

/// Entries with their off-chain content resolved.
pub type ResolvedStream = BoxStream<'static, StreamResult<ResolvedEntry>>;
