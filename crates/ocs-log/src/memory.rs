use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use ocs_types::{Entry, EntryKey, FeedId};
use serde_json::Value;
use tracing::debug;

use crate::error::{LogError, LogResult};
use crate::traits::{EntryStream, HistoryOptions, HistorySource, LogAppend};

/// In-memory hash-linked log for tests, local demos, and embedding.
///
/// Holds any number of feeds. [`LogAppend::append`] writes to the local
/// identity returned by [`InMemoryLog::whoami`]; [`InMemoryLog::append_for`]
/// writes to an arbitrary author.
pub struct InMemoryLog {
    identity: FeedId,
    inner: RwLock<LogState>,
}

#[derive(Default)]
struct LogState {
    feeds: HashMap<FeedId, Vec<Entry>>,
    key_index: HashMap<EntryKey, (FeedId, usize)>,
}

impl InMemoryLog {
    pub fn new(identity: FeedId) -> Self {
        Self {
            identity,
            inner: RwLock::new(LogState::default()),
        }
    }

    /// The local author identity.
    pub fn whoami(&self) -> FeedId {
        self.identity
    }

    /// Append an entry to `author`'s feed.
    pub fn append_for(&self, author: FeedId, body: Value) -> LogResult<Entry> {
        let mut state = self.write_state()?;
        let feed = state.feeds.entry(author).or_default();
        let last = feed.last();
        let seq = last.map_or(1, |e| e.seq + 1);
        let previous = last.map(|e| e.key);
        // Timestamps never run backwards within a feed.
        let timestamp_ms = last.map_or(0, |e| e.timestamp_ms).max(now_ms());

        let entry = Entry::new(author, seq, previous, timestamp_ms, body)
            .map_err(|e| LogError::Serialization(e.to_string()))?;
        if state.key_index.contains_key(&entry.key) {
            return Err(LogError::HashCollision);
        }

        let feed = state.feeds.entry(author).or_default();
        feed.push(entry.clone());
        let index = feed.len() - 1;
        state.key_index.insert(entry.key, (author, index));

        debug!(author = %author.short_id(), seq, key = %entry.key.short_hex(), "appended entry");
        Ok(entry)
    }

    pub fn get_by_key(&self, key: &EntryKey) -> LogResult<Option<Entry>> {
        let state = self.read_state()?;
        Ok(state
            .key_index
            .get(key)
            .and_then(|(author, index)| state.feeds.get(author)?.get(*index))
            .cloned())
    }

    /// All feeds with at least one entry, sorted.
    pub fn feeds(&self) -> LogResult<Vec<FeedId>> {
        let state = self.read_state()?;
        let mut feeds: Vec<FeedId> = state.feeds.keys().copied().collect();
        feeds.sort();
        Ok(feeds)
    }

    pub fn entry_count(&self, author: &FeedId) -> LogResult<u64> {
        let state = self.read_state()?;
        Ok(state.feeds.get(author).map_or(0, |f| f.len() as u64))
    }

    /// Validate sequence numbering, hash links, and keys of one feed.
    pub fn validate_feed(&self, author: &FeedId) -> LogResult<()> {
        let state = self.read_state()?;
        let feed = state
            .feeds
            .get(author)
            .ok_or(LogError::FeedNotFound(*author))?;

        for (index, entry) in feed.iter().enumerate() {
            let expected_seq = (index + 1) as u64;
            if entry.seq != expected_seq {
                return Err(LogError::IntegrityViolation {
                    seq: entry.seq,
                    reason: format!("expected seq {expected_seq}, found {}", entry.seq),
                });
            }

            let expected_prev = index.checked_sub(1).map(|i| feed[i].key);
            if entry.previous != expected_prev {
                return Err(LogError::IntegrityViolation {
                    seq: entry.seq,
                    reason: "previous hash link mismatch".into(),
                });
            }

            if entry.author != *author {
                return Err(LogError::IntegrityViolation {
                    seq: entry.seq,
                    reason: "entry attributed to another feed".into(),
                });
            }

            let key_ok = entry
                .verify_key()
                .map_err(|e| LogError::Serialization(e.to_string()))?;
            if !key_ok {
                return Err(LogError::IntegrityViolation {
                    seq: entry.seq,
                    reason: "entry key mismatch".into(),
                });
            }
        }
        Ok(())
    }

    fn read_state(&self) -> LogResult<RwLockReadGuard<'_, LogState>> {
        self.inner.read().map_err(|_| LogError::IntegrityViolation {
            seq: 0,
            reason: "log read lock poisoned".into(),
        })
    }

    fn write_state(&self) -> LogResult<RwLockWriteGuard<'_, LogState>> {
        self.inner.write().map_err(|_| LogError::IntegrityViolation {
            seq: 0,
            reason: "log write lock poisoned".into(),
        })
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new(FeedId::ephemeral())
    }
}

impl HistorySource for InMemoryLog {
    fn history(&self, opts: &HistoryOptions) -> EntryStream {
        let snapshot: LogResult<Vec<Entry>> = self.read_state().map(|state| {
            state
                .feeds
                .get(&opts.author)
                .map(|feed| {
                    feed.iter()
                        .filter(|e| e.seq >= opts.from_seq)
                        .take(opts.limit.unwrap_or(usize::MAX))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        });

        match snapshot {
            Ok(entries) => stream::iter(entries.into_iter().map(Ok)).boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }
}

#[async_trait]
impl LogAppend for InMemoryLog {
    async fn append(&self, body: Value) -> LogResult<Entry> {
        self.append_for(self.identity, body)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
