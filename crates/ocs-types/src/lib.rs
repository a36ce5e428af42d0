//! Foundation types for off-chain content streams.
//!
//! This crate provides the identity, entry, and reference types shared by
//! every other `ocs` crate.
//!
//! # Key Types
//!
//! - [`FeedId`] -- Author identity of a hash-linked feed
//! - [`Entry`] / [`EntryKey`] -- One immutable record of the log
//! - [`ContentAddress`] -- sha256/base64 address of off-chain JSON content
//! - [`BlobRef`] -- Reference to a binary blob owned by the blob store
//! - [`Reference`] -- Either of the above, decided by token format alone

pub mod entry;
pub mod error;
pub mod identity;
pub mod reference;

pub use entry::{Entry, EntryKey, ResolvedEntry};
pub use error::TypeError;
pub use identity::FeedId;
pub use reference::{
    is_blob_ref, is_content_address, BlobRef, ContentAddress, Reference, ReferenceKind,
    BLOB_SIGIL, BLOB_SUFFIX, CONTENT_SUFFIX,
};
