use std::sync::Arc;

use futures::stream::{StreamExt, TryStreamExt};
use ocs_log::EntryStream;
use ocs_store::ContentStore;
use ocs_types::{ContentAddress, Entry, ResolvedEntry};
use serde_json::Value;
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::item::ResolvedStream;

/// Attaches off-chain content to entries whose body is a content address.
///
/// Entries with any other body pass through unresolved. Absent content is not
/// an error: the entry is delivered with `content: None`.
#[derive(Clone)]
pub struct ContentResolver {
    store: Arc<dyn ContentStore>,
}

impl ContentResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, entry: Entry) -> StreamResult<ResolvedEntry> {
        let Some(address) = entry.content_address() else {
            return Ok(ResolvedEntry::unresolved(entry));
        };
        match self.store.get(&address).await? {
            Some(bytes) => {
                let content = decode_content(&address, &bytes)?;
                Ok(ResolvedEntry {
                    entry,
                    content: Some(content),
                })
            }
            None => {
                debug!(entry = %entry.key, %address, "content not available locally");
                Ok(ResolvedEntry::unresolved(entry))
            }
        }
    }

    /// Resolve every entry of a history stream, in order.
    pub fn resolve_stream(&self, entries: EntryStream) -> ResolvedStream {
        let resolver = self.clone();
        entries
            .map_err(StreamError::from)
            .and_then(move |entry| {
                let resolver = resolver.clone();
                async move { resolver.resolve(entry).await }
            })
            .boxed()
    }
}

pub(crate) fn decode_content(address: &ContentAddress, bytes: &[u8]) -> StreamResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| StreamError::Decode {
        address: *address,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;
    use ocs_crypto::DigestCodec;
    use ocs_log::{HistoryOptions, HistorySource, InMemoryLog, LogError};
    use ocs_store::InMemoryContentStore;
    use ocs_types::FeedId;
    use serde_json::json;

    use super::*;

    fn author() -> FeedId {
        FeedId::from_public_key(&[9; 32])
    }

    async fn store_json(store: &InMemoryContentStore, value: &Value) -> ContentAddress {
        let (address, bytes) = DigestCodec::encode(value).unwrap();
        store.put(&address, Bytes::from(bytes)).await.unwrap();
        address
    }

    #[tokio::test]
    async fn resolves_stored_content() {
        let store = Arc::new(InMemoryContentStore::new());
        let address = store_json(&store, &json!({"text": "hi"})).await;
        let log = InMemoryLog::new(author());
        let entry = log
            .append_for(author(), json!(address.to_string()))
            .unwrap();

        let resolved = ContentResolver::new(store).resolve(entry.clone()).await.unwrap();
        assert_eq!(resolved.entry, entry);
        assert_eq!(resolved.content, Some(json!({"text": "hi"})));
    }

    #[tokio::test]
    async fn missing_content_is_left_unresolved() {
        let store = Arc::new(InMemoryContentStore::new());
        let address = DigestCodec::address_of(b"\"elsewhere\"");
        let log = InMemoryLog::new(author());
        let entry = log
            .append_for(author(), json!(address.to_string()))
            .unwrap();

        let resolved = ContentResolver::new(store).resolve(entry).await.unwrap();
        assert!(resolved.content.is_none());
    }

    #[tokio::test]
    async fn plain_bodies_pass_through() {
        let store = Arc::new(InMemoryContentStore::new());
        let log = InMemoryLog::new(author());
        let entry = log.append_for(author(), json!({"type": "post"})).unwrap();

        let resolved = ContentResolver::new(store).resolve(entry.clone()).await.unwrap();
        assert_eq!(resolved, ResolvedEntry::unresolved(entry));
    }

    #[tokio::test]
    async fn non_json_content_fails_to_decode() {
        let store = Arc::new(InMemoryContentStore::new());
        let bytes: &'static [u8] = b"\xff\xfe not json";
        let address = DigestCodec::address_of(bytes);
        store.put(&address, Bytes::from_static(bytes)).await.unwrap();
        let log = InMemoryLog::new(author());
        let entry = log
            .append_for(author(), json!(address.to_string()))
            .unwrap();

        let err = ContentResolver::new(store).resolve(entry).await.unwrap_err();
        assert!(matches!(err, StreamError::Decode { address: a, .. } if a == address));
    }

    #[tokio::test]
    async fn resolve_stream_keeps_order() {
        let store = Arc::new(InMemoryContentStore::new());
        let log = InMemoryLog::new(author());
        for n in 0..3 {
            let address = store_json(&store, &json!({"n": n})).await;
            log.append_for(author(), json!(address.to_string())).unwrap();
        }

        let resolved: Vec<ResolvedEntry> = ContentResolver::new(store)
            .resolve_stream(log.history(&HistoryOptions::for_author(author())))
            .try_collect()
            .await
            .unwrap();
        let contents: Vec<Value> = resolved.into_iter().filter_map(|r| r.content).collect();
        assert_eq!(contents, vec![json!({"n": 0}), json!({"n": 1}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn resolve_stream_forwards_log_errors() {
        let store = Arc::new(InMemoryContentStore::new());
        let entries: EntryStream =
            stream::once(async { Err(LogError::FeedNotFound(author())) }).boxed();
        let result: StreamResult<Vec<ResolvedEntry>> = ContentResolver::new(store)
            .resolve_stream(entries)
            .try_collect()
            .await;
        assert!(matches!(result, Err(StreamError::Log(LogError::FeedNotFound(_)))));
    }
}
