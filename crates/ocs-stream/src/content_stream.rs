use std::sync::Arc;

use ocs_log::{HistoryOptions, HistorySource, LogAppend};
use ocs_store::{BlobStore, ContentStore};
use ocs_types::ReferenceKind;
use tokio::sync::oneshot;

use crate::blob_handler::{BlobHandler, BlobHandlerReport};
use crate::config::StreamConfig;
use crate::item::{EntryResultStream, ItemStream, ResolvedStream};
use crate::merger::DependencyFirstMerger;
use crate::publish::Publisher;
use crate::reconcile::ReconciliationHandler;
use crate::resolve::ContentResolver;

/// Named compositions of the stream stages over one log and its stores.
///
/// Every call starts an independent pass; nothing is shared between passes
/// except the stores themselves.
#[derive(Clone)]
pub struct ContentStream {
    log: Arc<dyn HistorySource>,
    content: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    config: StreamConfig,
}

impl ContentStream {
    pub fn new(
        log: Arc<dyn HistorySource>,
        content: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobStore>,
        config: StreamConfig,
    ) -> Self {
        Self {
            log,
            content,
            blobs,
            config,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Dependency-first merged stream of `kind` references for one feed.
    pub fn create_source(&self, opts: &HistoryOptions, kind: ReferenceKind) -> ItemStream {
        self.merger(kind).merge(opts)
    }

    pub fn create_blob_handler(&self) -> BlobHandler {
        BlobHandler::new(Arc::clone(&self.blobs))
    }

    /// Blob-mode source piped through a blob handler.
    pub fn create_blob_handler_source(
        &self,
        opts: &HistoryOptions,
    ) -> (EntryResultStream, oneshot::Receiver<BlobHandlerReport>) {
        self.create_blob_handler()
            .handle(self.create_source(opts, ReferenceKind::Blob))
    }

    /// Reconciler writing into this stream's content store.
    pub fn create_reconciler(&self) -> ReconciliationHandler {
        self.reconciler_into(Arc::clone(&self.content))
    }

    /// Content-mode source reconciled back into the local content store.
    pub fn content_source(&self, opts: &HistoryOptions) -> ResolvedStream {
        self.create_reconciler()
            .reconcile(self.create_source(opts, ReferenceKind::Content))
    }

    /// Content-mode source reconciled into another store, as a replicating
    /// peer would.
    pub fn content_source_into(
        &self,
        opts: &HistoryOptions,
        destination: Arc<dyn ContentStore>,
    ) -> ResolvedStream {
        self.reconciler_into(destination)
            .reconcile(self.create_source(opts, ReferenceKind::Content))
    }

    pub fn resolver(&self) -> ContentResolver {
        ContentResolver::new(Arc::clone(&self.content))
    }

    pub fn publisher(&self, log: Arc<dyn LogAppend>) -> Publisher {
        Publisher::new(Arc::clone(&self.content), log)
    }

    fn merger(&self, kind: ReferenceKind) -> DependencyFirstMerger {
        DependencyFirstMerger::new(
            Arc::clone(&self.log),
            Arc::clone(&self.content),
            Arc::clone(&self.blobs),
            kind,
        )
        .with_max_size(Some(self.config.max_payload_size))
    }

    fn reconciler_into(&self, store: Arc<dyn ContentStore>) -> ReconciliationHandler {
        ReconciliationHandler::new(store).annotate_content(self.config.annotate_content)
    }
}
