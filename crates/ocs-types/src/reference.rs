//! Payload references carried inside entry bodies.
//!
//! Two reference formats exist and they never overlap:
//!
//! - **Blob**: `&` + base64(sha256(bytes)) + `.sha256`, owned by the blob store.
//! - **Content**: base64(sha256(bytes)) + `.content.sha256`, owned by the
//!   off-chain content store.
//!
//! The token format alone decides which store resolves a reference.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Suffix tag identifying off-chain JSON content addressed by sha256/base64.
pub const CONTENT_SUFFIX: &str = ".content.sha256";

/// Leading sigil of a blob reference.
pub const BLOB_SIGIL: char = '&';

/// Trailing tag of a blob reference.
pub const BLOB_SUFFIX: &str = ".sha256";

const DIGEST_LEN: usize = 32;

fn decode_digest(encoded: &str) -> Result<[u8; DIGEST_LEN], TypeError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| TypeError::InvalidBase64(e.to_string()))?;
    let digest: [u8; DIGEST_LEN] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: bytes.len(),
            })?;
    // Only the canonical encoding of a digest names it.
    if STANDARD.encode(digest) != encoded {
        return Err(TypeError::InvalidBase64(format!(
            "non-canonical encoding: {encoded}"
        )));
    }
    Ok(digest)
}

// ---------------------------------------------------------------------------
// ContentAddress
// ---------------------------------------------------------------------------

/// Address of an off-chain content payload.
///
/// The address is the sha256 digest of the payload's canonical bytes. Its
/// string form doubles as the storage key and as the reference embedded in
/// log entries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress([u8; DIGEST_LEN]);

impl ContentAddress {
    /// Wrap a pre-computed sha256 digest.
    pub fn from_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self(digest)
    }

    /// Parse the string form, rejecting anything that is not exactly a
    /// canonical content address.
    pub fn parse(token: &str) -> Result<Self, TypeError> {
        let encoded = token
            .strip_suffix(CONTENT_SUFFIX)
            .ok_or_else(|| TypeError::NotAContentAddress(token.to_string()))?;
        decode_digest(encoded).map(Self)
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Hex form of the digest (filesystem-safe, unlike base64).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 base64 characters, for log output.
    pub fn short(&self) -> String {
        STANDARD.encode(self.0)[..8].to_string()
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", STANDARD.encode(self.0), CONTENT_SUFFIX)
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({})", self.short())
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// BlobRef
// ---------------------------------------------------------------------------

/// Reference to a binary blob held by the external blob store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef([u8; DIGEST_LEN]);

impl BlobRef {
    pub fn from_digest(digest: [u8; DIGEST_LEN]) -> Self {
        Self(digest)
    }

    pub fn parse(token: &str) -> Result<Self, TypeError> {
        let encoded = token
            .strip_prefix(BLOB_SIGIL)
            .and_then(|rest| rest.strip_suffix(BLOB_SUFFIX))
            .ok_or_else(|| TypeError::NotABlobRef(token.to_string()))?;
        decode_digest(encoded).map(Self)
    }

    pub fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLOB_SIGIL}{}{BLOB_SUFFIX}", STANDARD.encode(self.0))
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobRef({})", &STANDARD.encode(self.0)[..8])
    }
}

impl TryFrom<String> for BlobRef {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BlobRef> for String {
    fn from(blob: BlobRef) -> Self {
        blob.to_string()
    }
}

// ---------------------------------------------------------------------------
// Predicates and the unified reference
// ---------------------------------------------------------------------------

/// Returns `true` if `token` is a well-formed blob reference.
pub fn is_blob_ref(token: &str) -> bool {
    BlobRef::parse(token).is_ok()
}

/// Returns `true` if `token` is a well-formed content address.
pub fn is_content_address(token: &str) -> bool {
    ContentAddress::parse(token).is_ok()
}

/// Which family of references a pass is concerned with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Blob,
    Content,
}

impl ReferenceKind {
    /// Predicate over raw tokens for this kind.
    pub fn matches(&self, token: &str) -> bool {
        match self {
            Self::Blob => is_blob_ref(token),
            Self::Content => is_content_address(token),
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Content => write!(f, "content"),
        }
    }
}

/// A parsed payload reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    Blob(BlobRef),
    Content(ContentAddress),
}

impl Reference {
    /// Classify a token by format. Returns `None` for ordinary strings.
    pub fn parse(token: &str) -> Option<Self> {
        if let Ok(blob) = BlobRef::parse(token) {
            return Some(Self::Blob(blob));
        }
        ContentAddress::parse(token).ok().map(Self::Content)
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            Self::Blob(_) => ReferenceKind::Blob,
            Self::Content(_) => ReferenceKind::Content,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(blob) => fmt::Display::fmt(blob, f),
            Self::Content(address) => fmt::Display::fmt(address, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(seed: u8) -> [u8; 32] {
        [seed; 32]
    }

    #[test]
    fn content_address_string_roundtrip() {
        let address = ContentAddress::from_digest(digest(3));
        let text = address.to_string();
        assert!(text.ends_with(CONTENT_SUFFIX));
        assert_eq!(ContentAddress::parse(&text).unwrap(), address);
    }

    #[test]
    fn content_address_has_fixed_length() {
        // 44 base64 characters + suffix
        let text = ContentAddress::from_digest(digest(0)).to_string();
        assert_eq!(text.len(), 44 + CONTENT_SUFFIX.len());
    }

    #[test]
    fn blob_ref_string_roundtrip() {
        let blob = BlobRef::from_digest(digest(9));
        let text = blob.to_string();
        assert!(text.starts_with('&'));
        assert!(text.ends_with(BLOB_SUFFIX));
        assert_eq!(BlobRef::parse(&text).unwrap(), blob);
    }

    #[test]
    fn formats_are_disjoint() {
        let content = ContentAddress::from_digest(digest(1)).to_string();
        let blob = BlobRef::from_digest(digest(1)).to_string();
        assert!(is_content_address(&content));
        assert!(!is_blob_ref(&content));
        assert!(is_blob_ref(&blob));
        assert!(!is_content_address(&blob));
    }

    #[test]
    fn sigil_on_content_address_is_rejected() {
        let text = format!("&{}", ContentAddress::from_digest(digest(1)));
        assert!(!is_content_address(&text));
        assert!(!is_blob_ref(&text));
    }

    #[test]
    fn ordinary_strings_are_not_references() {
        for token in ["hello", "", ".content.sha256", "&.sha256", "%abc.sha256"] {
            assert!(Reference::parse(token).is_none(), "{token}");
        }
    }

    #[test]
    fn short_digest_is_rejected() {
        let token = format!("{}{}", STANDARD.encode([1u8; 16]), CONTENT_SUFFIX);
        assert!(matches!(
            ContentAddress::parse(&token),
            Err(TypeError::InvalidLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn reference_parse_classifies() {
        let blob = BlobRef::from_digest(digest(4));
        let content = ContentAddress::from_digest(digest(4));
        assert_eq!(
            Reference::parse(&blob.to_string()),
            Some(Reference::Blob(blob))
        );
        assert_eq!(
            Reference::parse(&content.to_string()),
            Some(Reference::Content(content))
        );
        assert_eq!(
            Reference::parse(&content.to_string()).map(|r| r.kind()),
            Some(ReferenceKind::Content)
        );
    }

    #[test]
    fn kind_predicates() {
        let blob = BlobRef::from_digest(digest(5)).to_string();
        assert!(ReferenceKind::Blob.matches(&blob));
        assert!(!ReferenceKind::Content.matches(&blob));
    }

    #[test]
    fn serde_uses_string_form() {
        let address = ContentAddress::from_digest(digest(6));
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));
        let parsed: ContentAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
        assert!(serde_json::from_str::<ContentAddress>("\"nope\"").is_err());
    }

    #[test]
    fn hex_is_filesystem_safe() {
        let hex = ContentAddress::from_digest([0xff; 32]).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn formats_never_overlap(bytes in any::<[u8; 32]>()) {
                let content = ContentAddress::from_digest(bytes).to_string();
                let blob = BlobRef::from_digest(bytes).to_string();
                prop_assert!(is_content_address(&content) && !is_blob_ref(&content));
                prop_assert!(is_blob_ref(&blob) && !is_content_address(&blob));
                prop_assert_eq!(
                    Reference::parse(&content).map(|r| r.kind()),
                    Some(ReferenceKind::Content)
                );
                prop_assert_eq!(
                    Reference::parse(&blob).map(|r| r.kind()),
                    Some(ReferenceKind::Blob)
                );
            }
        }
    }
}
