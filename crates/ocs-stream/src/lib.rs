//! Dependency-first content streams over a hash-linked log.
//!
//! Log entries carry references to payloads held outside the log. Replaying
//! such a log through this crate delivers every referenced payload before the
//! entries that need it, and on the receiving side refuses any entry whose
//! content did not arrive.
//!
//! # Stages
//!
//! - [`ReferenceExtractor`] -- collects reference tokens from an entry body
//! - [`DependencyFirstMerger`] -- payloads first, then the entries
//! - [`ReconciliationHandler`] -- matches payloads to entries and persists them
//! - [`BlobHandler`] -- adds blob payloads to the blob store
//! - [`Publisher`] -- stores content, then appends its address
//! - [`ContentResolver`] -- attaches stored content to entries
//!
//! [`ContentStream`] wires these together over one log and its stores.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use futures::TryStreamExt;
//! use ocs_log::{HistoryOptions, InMemoryLog};
//! use ocs_store::{InMemoryBlobStore, InMemoryContentStore};
//! use ocs_stream::{ContentStream, StreamConfig};
//! use ocs_types::FeedId;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let me = FeedId::ephemeral();
//! let log = Arc::new(InMemoryLog::new(me));
//! let cs = ContentStream::new(
//!     log.clone(),
//!     Arc::new(InMemoryContentStore::new()),
//!     Arc::new(InMemoryBlobStore::new()),
//!     StreamConfig::default(),
//! );
//!
//! cs.publisher(log).publish(&serde_json::json!({"text": "hi"})).await.unwrap();
//!
//! let resolved: Vec<_> = cs
//!     .content_source(&HistoryOptions::for_author(me))
//!     .try_collect()
//!     .await
//!     .unwrap();
//! assert_eq!(resolved[0].content, Some(serde_json::json!({"text": "hi"})));
//! # }
//! ```

pub mod blob_handler;
pub mod config;
pub mod content_stream;
pub mod error;
pub mod extractor;
pub mod item;
pub mod merger;
pub mod publish;
pub mod reconcile;
pub mod resolve;

pub use blob_handler::{BlobHandler, BlobHandlerReport};
pub use config::StreamConfig;
pub use content_stream::ContentStream;
pub use error::{ConfigError, StreamError, StreamResult};
pub use extractor::ReferenceExtractor;
pub use item::{EntryResultStream, ItemStream, ResolvedStream, StreamItem};
pub use merger::DependencyFirstMerger;
pub use publish::Publisher;
pub use reconcile::ReconciliationHandler;
pub use resolve::ContentResolver;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use futures::TryStreamExt;
    use ocs_crypto::DigestCodec;
    use ocs_log::{HistoryOptions, HistorySource, InMemoryLog};
    use ocs_store::{
        BlobStore, ContentStore, FsContentStore, InMemoryBlobStore, InMemoryContentStore,
    };
    use ocs_types::{Entry, FeedId, ReferenceKind, ResolvedEntry};
    use serde_json::json;

    use super::*;

    fn author() -> FeedId {
        FeedId::from_public_key(&[1; 32])
    }

    struct World {
        log: Arc<InMemoryLog>,
        content: Arc<InMemoryContentStore>,
        blobs: Arc<InMemoryBlobStore>,
        cs: ContentStream,
    }

    fn world() -> World {
        let log = Arc::new(InMemoryLog::new(author()));
        let content = Arc::new(InMemoryContentStore::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let cs = ContentStream::new(
            log.clone(),
            content.clone(),
            blobs.clone(),
            StreamConfig::default(),
        );
        World {
            log,
            content,
            blobs,
            cs,
        }
    }

    impl World {
        fn publisher(&self) -> Publisher {
            self.cs.publisher(self.log.clone())
        }

        fn opts(&self) -> HistoryOptions {
            HistoryOptions::for_author(author())
        }

        async fn resolved(&self) -> Vec<ResolvedEntry> {
            self.cs.content_source(&self.opts()).try_collect().await.unwrap()
        }
    }

    // -----------------------------------------------------------------------
    // 1. Publishing the same content twice
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn publish_twice_stores_once_and_resolves_both() {
        let w = world();
        let publisher = w.publisher();
        let first = publisher.publish(&json!("hello")).await.unwrap();
        let second = publisher.publish(&json!("hello")).await.unwrap();
        assert_eq!(first.body, second.body);
        assert_ne!(first.key, second.key);
        assert_eq!(w.content.len(), 1);

        let resolved = w.resolved().await;
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|r| r.content == Some(json!("hello"))));
        assert_eq!(w.content.len(), 1);
    }

    // -----------------------------------------------------------------------
    // 2. Repeated content is delivered once
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn repeated_publish_yields_two_dependencies() {
        let w = world();
        let publisher = w.publisher();
        for text in ["hello", "world", "hello"] {
            publisher.publish(&json!(text)).await.unwrap();
        }

        let items: Vec<StreamItem> = w
            .cs
            .create_source(&w.opts(), ReferenceKind::Content)
            .try_collect()
            .await
            .unwrap();
        let payloads: Vec<&StreamItem> = items.iter().filter(|i| i.is_payload()).collect();
        assert_eq!(payloads.len(), 2);
        assert_eq!(items.len(), 5);
        assert!(items[..2].iter().all(StreamItem::is_payload));
    }

    // -----------------------------------------------------------------------
    // 3. Blob handler source
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn blob_handler_source_counts_unique_blobs() {
        let w = world();
        let cat = w.blobs.add(Bytes::from_static(b"cat.png")).await.unwrap();
        let dog = w.blobs.add(Bytes::from_static(b"dog.png")).await.unwrap();
        w.log.append_for(author(), json!({"img": cat.to_string()})).unwrap();
        w.log.append_for(author(), json!({"img": dog.to_string()})).unwrap();
        w.log.append_for(author(), json!({"img": cat.to_string()})).unwrap();

        let (entries, report) = w.cs.create_blob_handler_source(&w.opts());
        let entries: Vec<Entry> = entries.try_collect().await.unwrap();
        assert_eq!(entries.len(), 3);

        let report = report.await.unwrap();
        assert!(report.is_ok());
        assert_eq!(report.added, 2);
    }

    // -----------------------------------------------------------------------
    // 4. Missing content is rejected
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn unpublished_content_fails_reconciliation() {
        let w = world();
        let address = DigestCodec::address_of(b"\"never stored\"");
        w.log.append_for(author(), json!(address.to_string())).unwrap();

        let destination = Arc::new(InMemoryContentStore::new());
        let result: StreamResult<Vec<ResolvedEntry>> = w
            .cs
            .content_source_into(&w.opts(), destination.clone())
            .try_collect()
            .await;
        assert!(matches!(
            result,
            Err(StreamError::MissingDependency { address: a, .. }) if a == address
        ));
        assert!(destination.is_empty());
    }

    // -----------------------------------------------------------------------
    // 5. Replication into another store
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn content_replicates_into_a_fresh_store() {
        let w = world();
        let publisher = w.publisher();
        publisher.publish(&json!({"title": "one"})).await.unwrap();
        publisher.publish(&json!({"title": "two"})).await.unwrap();
        w.log.append_for(author(), json!({"type": "vote"})).unwrap();

        let destination = Arc::new(InMemoryContentStore::new());
        let resolved: Vec<ResolvedEntry> = w
            .cs
            .content_source_into(&w.opts(), destination.clone())
            .try_collect()
            .await
            .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].content, Some(json!({"title": "one"})));
        assert_eq!(resolved[1].content, Some(json!({"title": "two"})));
        assert!(resolved[2].content.is_none());
        assert_eq!(destination.addresses(), w.content.addresses());
    }

    #[tokio::test]
    async fn replication_onto_disk_survives_reopen() {
        let w = world();
        let entry = w.publisher().publish(&json!({"kept": true})).await.unwrap();
        let address = entry.content_address().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let disk = Arc::new(FsContentStore::open(dir.path()).await.unwrap());
        let _: Vec<ResolvedEntry> = w
            .cs
            .content_source_into(&w.opts(), disk)
            .try_collect()
            .await
            .unwrap();

        let reopened = FsContentStore::open(dir.path()).await.unwrap();
        let bytes = reopened.get(&address).await.unwrap().unwrap();
        assert!(DigestCodec::verify(&bytes, &address));
    }

    // -----------------------------------------------------------------------
    // 6. Resolver as a map function over plain history
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn resolver_maps_history() {
        let w = world();
        w.publisher().publish(&json!([1, 2, 3])).await.unwrap();

        let history = w.log.history(&w.opts());
        let resolved: Vec<ResolvedEntry> = w
            .cs
            .resolver()
            .resolve_stream(history)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(resolved[0].content, Some(json!([1, 2, 3])));
    }

    #[tokio::test]
    async fn concurrent_passes_do_not_interfere() {
        let w = world();
        let publisher = w.publisher();
        for n in 0..8 {
            publisher.publish(&json!({"n": n})).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cs = w.cs.clone();
            let opts = w.opts();
            handles.push(tokio::spawn(async move {
                let resolved: Vec<ResolvedEntry> =
                    cs.content_source(&opts).try_collect().await.unwrap();
                resolved.len()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 8);
        }
        assert_eq!(w.content.len(), 8);
    }
}
