//! Content-addressed payload storage for off-chain content streams.
//!
//! Two stores live here:
//!
//! - [`ContentStore`] holds off-chain JSON content keyed by
//!   [`ContentAddress`](ocs_types::ContentAddress). Every write is checked
//!   against the address it claims, and every read is re-hashed.
//! - [`BlobStore`] is the interface of the external blob store, keyed by
//!   [`BlobRef`](ocs_types::BlobRef).
//!
//! # Storage Backends
//!
//! - [`InMemoryContentStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsContentStore`] -- one file per payload under a fan-out directory
//! - [`InMemoryBlobStore`] -- `HashMap`-based blob store
//!
//! # Design Rules
//!
//! 1. Payloads are write-once per address; a second identical write is a no-op.
//! 2. A write whose bytes do not hash to its address is rejected.
//! 3. Different bytes under an existing address are a conflict, never an overwrite.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsContentStore;
pub use memory::{InMemoryBlobStore, InMemoryContentStore};
pub use traits::{check_address, BlobStore, ContentStore, PutOutcome};
