//! redb substrate for the event tracker.
pub mod backend;

pub use backend::{StorageBackend, StorageError};
// Re-export for convenience; canonical home is tracker_model::StorageConfig
pub use tracker_model::StorageConfig;
