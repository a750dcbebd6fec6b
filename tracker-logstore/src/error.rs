use std::fmt;

use thiserror::Error;
use tracker_model::CodecError;

/// Stage of an operation at which the substrate failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    Open,
    Read,
    Truncate,
    Append,
    Checkpoint,
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Begin => "begin",
            Phase::Open => "open",
            Phase::Read => "read",
            Phase::Truncate => "truncate",
            Phase::Append => "append",
            Phase::Checkpoint => "checkpoint",
            Phase::Commit => "commit",
        };
        f.write_str(name)
    }
}

/// Stored value that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Record(u64),
    Checkpoint,
    /// A key in the log range that is not a well-formed log key.
    Key(Vec<u8>),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Record(index) => write!(f, "record {index}"),
            Subject::Checkpoint => f.write_str("checkpoint"),
            Subject::Key(key) => write!(f, "key {key:02x?}"),
        }
    }
}

/// Batch value that failed to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchItem {
    /// Position within the appended records.
    Record(usize),
    Checkpoint,
}

impl fmt::Display for BatchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchItem::Record(position) => write!(f, "appended record #{position}"),
            BatchItem::Checkpoint => f.write_str("checkpoint"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("Storage unavailable for '{namespace}' during {phase}: {source}")]
    StorageUnavailable {
        namespace: String,
        phase: Phase,
        #[source]
        source: redb::Error,
    },

    #[error("No record at index {index} in '{namespace}'")]
    NotFound { namespace: String, index: u64 },

    #[error("Corrupt {subject} in '{namespace}': {source}")]
    CorruptData {
        namespace: String,
        subject: Subject,
        #[source]
        source: CodecError,
    },

    #[error("Failed to encode {item} for '{namespace}': {source}")]
    Encoding {
        namespace: String,
        item: BatchItem,
        #[source]
        source: CodecError,
    },
}

impl LogStoreError {
    /// Only substrate failures are worth retrying; the rest are
    /// deterministic for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LogStoreError::StorageUnavailable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LogStoreError::NotFound { .. })
    }

    pub fn namespace(&self) -> &str {
        match self {
            LogStoreError::StorageUnavailable { namespace, .. }
            | LogStoreError::NotFound { namespace, .. }
            | LogStoreError::CorruptData { namespace, .. }
            | LogStoreError::Encoding { namespace, .. } => namespace,
        }
    }

    pub(crate) fn unavailable(namespace: &str, phase: Phase, source: impl Into<redb::Error>) -> Self {
        LogStoreError::StorageUnavailable {
            namespace: namespace.to_string(),
            phase,
            source: source.into(),
        }
    }
}
