use std::path::PathBuf;

/// Configuration for where to store data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// File-backed storage at the given database file path.
    File(PathBuf),
    /// In-memory storage (no filesystem). Useful for tests.
    InMemory,
}

impl StorageConfig {
    /// File-backed storage when a path is given, in-memory otherwise.
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::InMemory,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(StorageConfig::from_path(None), StorageConfig::InMemory);
        let config = StorageConfig::from_path(Some(PathBuf::from("/tmp/tracker.db")));
        assert!(config.is_persistent());
    }
}
