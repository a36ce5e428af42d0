use indexmap::IndexSet;
use ocs_types::{is_blob_ref, is_content_address, ReferenceKind};
use serde_json::Value;

/// Collects every string leaf of an entry body that satisfies a predicate.
///
/// Sequences are walked in index order and mappings in key order
/// (`serde_json::Map` is sorted), so output order is stable for a given
/// tree. Mapping keys themselves are never candidates. Repeated references
/// are reported once, at their first position.
pub struct ReferenceExtractor<P = fn(&str) -> bool> {
    predicate: P,
}

impl ReferenceExtractor {
    /// Blob references (`&...sha256`).
    pub fn blobs() -> Self {
        Self::new(is_blob_ref)
    }

    /// Off-chain content addresses.
    pub fn content() -> Self {
        Self::new(is_content_address)
    }

    pub fn for_kind(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Blob => Self::blobs(),
            ReferenceKind::Content => Self::content(),
        }
    }
}

impl<P> ReferenceExtractor<P>
where
    P: Fn(&str) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }

    pub fn extract(&self, body: &Value) -> IndexSet<String> {
        let mut found = IndexSet::new();
        self.walk(body, &mut found);
        found
    }

    fn walk(&self, value: &Value, found: &mut IndexSet<String>) {
        match value {
            Value::String(token) => {
                if (self.predicate)(token) && !found.contains(token.as_str()) {
                    found.insert(token.clone());
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, found);
                }
            }
            Value::Object(map) => {
                for item in map.values() {
                    self.walk(item, found);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}
