//! Digest codec for off-chain content streams.
//!
//! Content addresses are plain sha256 over canonical bytes (no salt, no
//! domain tag), so any party holding the payload can recompute them.

pub mod codec;

pub use codec::{CodecError, DigestCodec};
