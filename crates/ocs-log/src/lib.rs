//! Log collaborator boundary for off-chain content streams.
//!
//! The hash-linked log itself is owned elsewhere. This crate provides:
//! - `HistorySource` / `LogAppend` trait boundaries consumed by the stream core
//! - `HistoryOptions` for selecting a feed range
//! - `InMemoryLog`, a hash-linked multi-author log for tests and embedding

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{LogError, LogResult};
pub use memory::InMemoryLog;
pub use traits::{EntryStream, HistoryOptions, HistorySource, LogAppend};
