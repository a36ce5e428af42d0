use async_trait::async_trait;
use futures::stream::BoxStream;
use ocs_types::{Entry, FeedId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LogResult;

/// A pull-based stream of entries replayed from the log.
pub type EntryStream = BoxStream<'static, LogResult<Entry>>;

/// Selects a range of one author's feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryOptions {
    pub author: FeedId,
    /// First sequence number to include (feeds start at 1).
    pub from_seq: u64,
    pub limit: Option<usize>,
}

impl HistoryOptions {
    /// The whole feed of `author`.
    pub fn for_author(author: FeedId) -> Self {
        Self {
            author,
            from_seq: 1,
            limit: None,
        }
    }

    pub fn from_seq(mut self, seq: u64) -> Self {
        self.from_seq = seq;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read boundary: replay of a feed's history.
///
/// Implementations must be idempotently replayable: two calls with equal
/// options yield the same entries in the same order. The dependency-first
/// merger relies on this and does not check it.
pub trait HistorySource: Send + Sync {
    fn history(&self, opts: &HistoryOptions) -> EntryStream;
}

/// Write boundary: append a new entry with the given body.
#[async_trait]
pub trait LogAppend: Send + Sync {
    async fn append(&self, body: Value) -> LogResult<Entry>;
}
