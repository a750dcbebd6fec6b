//! LogStore - truncatable, append-only log with a checkpoint per stream
//!
//! Each stream lives in its own redb table (its namespace). Within a
//! namespace, log records sit under `logs-` + big-endian index and the
//! checkpoint under `last-block`. Truncate, append and checkpoint are applied
//! in a single write transaction.
//!
//! Resolve a namespace once with [`NamespaceResolver`], then issue reads and
//! batches against the returned [`LogEntryStore`].

mod batch;
mod error;
pub mod keys;
mod resolver;
mod store;

pub use batch::{BatchSummary, LogBatch};
pub use error::{BatchItem, LogStoreError, Phase, Subject};
pub use resolver::NamespaceResolver;
pub use store::LogEntryStore;
