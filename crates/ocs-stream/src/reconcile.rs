//! Reconciliation of a content-mode merged stream.
//!
//! Payloads are staged in memory until an entry claims them. An entry is only
//! let through once every content address it names is either staged (and then
//! written to the store) or was already written earlier in the same pass.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use ocs_crypto::DigestCodec;
use ocs_store::ContentStore;
use ocs_types::{ContentAddress, Entry, ResolvedEntry};
use tracing::{debug, warn};

use crate::error::{StreamError, StreamResult};
use crate::extractor::ReferenceExtractor;
use crate::item::{ItemStream, ResolvedStream, StreamItem};
use crate::resolve::decode_content;

/// Persists matched payloads and rejects entries whose content never arrived.
#[derive(Clone)]
pub struct ReconciliationHandler {
    store: Arc<dyn ContentStore>,
    annotate: bool,
}

impl ReconciliationHandler {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            annotate: true,
        }
    }

    /// Attach decoded content to entries whose body is a content address.
    pub fn annotate_content(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Run one reconciliation pass over `upstream`.
    ///
    /// The first error ends the stream. Entries already yielded stay valid.
    pub fn reconcile(&self, upstream: ItemStream) -> ResolvedStream {
        let pass = ReconcilePass {
            upstream,
            store: Arc::clone(&self.store),
            annotate: self.annotate,
            pending: IndexMap::new(),
            reconciled: HashSet::new(),
        };
        stream::try_unfold(pass, |mut pass| async move {
            pass.next_resolved()
                .await
                .map(|next| next.map(|resolved| (resolved, pass)))
        })
        .boxed()
    }
}

struct ReconcilePass {
    upstream: ItemStream,
    store: Arc<dyn ContentStore>,
    annotate: bool,
    pending: IndexMap<ContentAddress, Bytes>,
    reconciled: HashSet<ContentAddress>,
}

impl ReconcilePass {
    async fn next_resolved(&mut self) -> StreamResult<Option<ResolvedEntry>> {
        while let Some(item) = self.upstream.next().await {
            match item? {
                StreamItem::Payload(payload) => self.stage(payload),
                StreamItem::Entry(entry) => return self.accept(entry).await.map(Some),
            }
        }
        self.finish()?;
        Ok(None)
    }

    fn stage(&mut self, payload: Bytes) {
        let address = DigestCodec::address_of(&payload);
        if self.reconciled.contains(&address) {
            debug!(%address, "payload already reconciled in this pass");
            return;
        }
        debug!(%address, bytes = payload.len(), "staged payload");
        self.pending.entry(address).or_insert(payload);
    }

    async fn accept(&mut self, entry: Entry) -> StreamResult<ResolvedEntry> {
        let references: Vec<ContentAddress> = ReferenceExtractor::content()
            .extract(&entry.body)
            .iter()
            .filter_map(|token| ContentAddress::parse(token).ok())
            .collect();

        for address in &references {
            if !self.pending.contains_key(address) && !self.reconciled.contains(address) {
                warn!(entry = %entry.key, %address, "entry references content that never arrived");
                return Err(StreamError::MissingDependency {
                    entry: entry.key,
                    address: *address,
                });
            }
        }

        let mut written: Vec<(ContentAddress, Bytes)> = Vec::new();
        for address in references {
            let Some(payload) = self.pending.get(&address).cloned() else {
                continue;
            };
            let outcome = self.store.put(&address, payload.clone()).await?;
            debug!(entry = %entry.key, %address, ?outcome, "reconciled payload");
            self.pending.shift_remove(&address);
            self.reconciled.insert(address);
            written.push((address, payload));
        }

        if !self.annotate {
            return Ok(ResolvedEntry::unresolved(entry));
        }
        let Some(address) = entry.content_address() else {
            return Ok(ResolvedEntry::unresolved(entry));
        };
        let bytes = match written.into_iter().find(|(a, _)| *a == address) {
            Some((_, bytes)) => Some(bytes),
            None => self.store.get(&address).await?,
        };
        let content = match bytes {
            Some(bytes) => Some(decode_content(&address, &bytes)?),
            None => None,
        };
        Ok(ResolvedEntry { entry, content })
    }

    fn finish(&mut self) -> StreamResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let addresses: Vec<ContentAddress> = self.pending.drain(..).map(|(a, _)| a).collect();
        warn!(count = addresses.len(), "payloads left without a referencing entry");
        Err(StreamError::UnmatchedPayloads { addresses })
    }
}
