//! Dependency-first merge of a feed's history.
//!
//! The merged stream is the concatenation of
//!
//! 1. every distinct payload referenced anywhere in the history, fetched from
//!    the store that owns its reference format, in first-seen order, and
//! 2. every entry of the history, unmodified, in source order.
//!
//! The history is replayed twice. The second replay is only started once the
//! dependency phase is drained.

use std::sync::Arc;

use bytes::Bytes;
use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use indexmap::IndexSet;
use ocs_log::{HistoryOptions, HistorySource};
use ocs_store::{BlobStore, ContentStore};
use ocs_types::{Reference, ReferenceKind};
use tracing::debug;

use crate::error::{StreamError, StreamResult};
use crate::extractor::ReferenceExtractor;
use crate::item::{ItemStream, StreamItem};

/// Builds dependency-first streams over a replayable history source.
#[derive(Clone)]
pub struct DependencyFirstMerger {
    source: Arc<dyn HistorySource>,
    content: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    kind: ReferenceKind,
    max_size: Option<u64>,
}

impl DependencyFirstMerger {
    pub fn new(
        source: Arc<dyn HistorySource>,
        content: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobStore>,
        kind: ReferenceKind,
    ) -> Self {
        Self {
            source,
            content,
            blobs,
            kind,
            max_size: None,
        }
    }

    /// Skip dependencies larger than `max_size` bytes.
    pub fn with_max_size(mut self, max_size: Option<u64>) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// Start one merge pass.
    ///
    /// Dependency fetch failures are logged and the dependency is left out;
    /// errors from the history source end the stream.
    pub fn merge(&self, opts: &HistoryOptions) -> ItemStream {
        let extractor = ReferenceExtractor::for_kind(self.kind);
        let mut dedup: IndexSet<String> = IndexSet::new();
        let content = Arc::clone(&self.content);
        let blobs = Arc::clone(&self.blobs);
        let max_size = self.max_size;

        let dependencies = self
            .source
            .history(opts)
            .map_err(StreamError::from)
            .map_ok(move |entry| {
                let tokens = extractor.extract(&entry.body);
                stream::iter(tokens.into_iter().map(Ok::<_, StreamError>))
            })
            .try_flatten()
            .try_filter(move |token| future::ready(dedup.insert(token.clone())))
            .and_then(move |token| {
                let content = Arc::clone(&content);
                let blobs = Arc::clone(&blobs);
                async move {
                    Ok::<_, StreamError>(
                        fetch_dependency(content.as_ref(), blobs.as_ref(), &token, max_size).await,
                    )
                }
            })
            .try_filter_map(future::ok)
            .map_ok(StreamItem::Payload);

        let source = Arc::clone(&self.source);
        let opts = opts.clone();
        let entries = stream::once(async move { source.history(&opts) })
            .flatten()
            .map_err(StreamError::from)
            .map_ok(StreamItem::Entry);

        dependencies.chain(entries).boxed()
    }
}

/// Resolve one reference, or `None` if it cannot be had right now.
async fn fetch_dependency(
    content: &dyn ContentStore,
    blobs: &dyn BlobStore,
    token: &str,
    max_size: Option<u64>,
) -> Option<Bytes> {
    let fetched: StreamResult<Bytes> = match Reference::parse(token) {
        Some(Reference::Blob(blob)) => blobs.get(&blob, max_size).await.map_err(Into::into),
        Some(Reference::Content(address)) => content
            .get_bounded(&address, max_size)
            .await
            .map_err(Into::into),
        None => return None,
    };
    match fetched {
        Ok(bytes) => {
            debug!(reference = token, bytes = bytes.len(), "fetched dependency");
            Some(bytes)
        }
        Err(e) => {
            debug!(reference = token, error = %e, "harmless error fetching dependency");
            None
        }
    }
}
