use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use ocs_store::{BlobStore, StoreError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::item::{EntryResultStream, ItemStream, StreamItem};

/// Outcome of one blob-handling pass, sent when the upstream is exhausted.
#[derive(Debug, Default)]
pub struct BlobHandlerReport {
    /// Blobs successfully added to the blob store.
    pub added: usize,
    /// Failed adds. These never interrupt the entry stream.
    pub errors: Vec<StoreError>,
    /// The error that ended the upstream, if any.
    pub upstream_error: Option<String>,
}

impl BlobHandlerReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.upstream_error.is_none()
    }
}

/// Stores the payloads of a blob-mode merged stream and passes entries on.
#[derive(Clone)]
pub struct BlobHandler {
    blobs: Arc<dyn BlobStore>,
}

impl BlobHandler {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Split `upstream` into its entries and a completion report.
    ///
    /// The report is sent once the upstream ends or fails. Dropping the
    /// returned stream before that closes the channel without a report.
    pub fn handle(
        &self,
        upstream: ItemStream,
    ) -> (EntryResultStream, oneshot::Receiver<BlobHandlerReport>) {
        let (tx, rx) = oneshot::channel();
        let state = HandlerState {
            upstream,
            blobs: Arc::clone(&self.blobs),
            report: BlobHandlerReport::default(),
            done: Some(tx),
        };

        let entries = stream::unfold(state, |mut state| async move {
            if state.done.is_none() {
                return None;
            }
            while let Some(item) = state.upstream.next().await {
                match item {
                    Ok(StreamItem::Payload(bytes)) => state.add(bytes).await,
                    Ok(StreamItem::Entry(entry)) => return Some((Ok(entry), state)),
                    Err(e) => {
                        state.report.upstream_error = Some(e.to_string());
                        state.complete();
                        return Some((Err(e), state));
                    }
                }
            }
            state.complete();
            None
        });
        (entries.boxed(), rx)
    }
}

struct HandlerState {
    upstream: ItemStream,
    blobs: Arc<dyn BlobStore>,
    report: BlobHandlerReport,
    done: Option<oneshot::Sender<BlobHandlerReport>>,
}

impl HandlerState {
    async fn add(&mut self, bytes: Bytes) {
        let size = bytes.len();
        match self.blobs.add(bytes).await {
            Ok(blob) => {
                debug!(%blob, bytes = size, "added blob");
                self.report.added += 1;
            }
            Err(e) => {
                warn!(error = %e, "failed to add blob");
                self.report.errors.push(e);
            }
        }
    }

    fn complete(&mut self) {
        if let Some(tx) = self.done.take() {
            let report = std::mem::take(&mut self.report);
            debug!(added = report.added, errors = report.errors.len(), "blob pass complete");
            // The receiver may already be gone.
            let _ = tx.send(report);
        }
    }
}
