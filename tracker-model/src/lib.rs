//! Shared types for the event tracker.
//!
//! Holds the storage configuration, the byte-level `Codec` contract used by
//! the log store, and the record types the tracker persists.

pub mod codec;
pub mod storage_config;
pub mod types;

pub use codec::{Codec, CodecError};
pub use storage_config::StorageConfig;
pub use types::{Block, Log, TrackerEvent};
