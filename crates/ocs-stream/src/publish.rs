use std::sync::Arc;

use bytes::Bytes;
use ocs_crypto::DigestCodec;
use ocs_log::LogAppend;
use ocs_store::ContentStore;
use ocs_types::Entry;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::StreamResult;

/// Stores content off-chain and appends its address to the log.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ContentStore>,
    log: Arc<dyn LogAppend>,
}

impl Publisher {
    pub fn new(store: Arc<dyn ContentStore>, log: Arc<dyn LogAppend>) -> Self {
        Self { store, log }
    }

    /// Publish `content` and return the appended entry.
    ///
    /// The payload is stored before the append. If storing fails nothing is
    /// appended.
    pub async fn publish<T>(&self, content: &T) -> StreamResult<Entry>
    where
        T: Serialize + ?Sized + Sync,
    {
        let (address, bytes) = DigestCodec::encode(content)?;
        let size = bytes.len();
        let outcome = self.store.put(&address, Bytes::from(bytes)).await?;
        debug!(%address, bytes = size, ?outcome, "stored off-chain content");

        let entry = self.log.append(Value::String(address.to_string())).await?;
        debug!(entry = %entry.key, seq = entry.seq, "appended content reference");
        Ok(entry)
    }
}
