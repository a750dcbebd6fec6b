use redb::backends::InMemoryBackend;
use redb::{Database, TableHandle};
use std::sync::Arc;
use thiserror::Error;
use tracker_model::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Owner of the shared redb handle.
///
/// Opens the database described by a `StorageConfig` and hands out
/// reference-counted clones of the connection. Every log namespace resolved
/// from one backend shares the same `Database`, so they also share its
/// single-writer lock.
#[derive(Clone)]
pub struct StorageBackend {
    db: Arc<Database>,
}

impl std::fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackend").finish_non_exhaustive()
    }
}

impl StorageBackend {
    /// Open or create the database described by `config`.
    ///
    /// For `File`, missing parent directories are created first.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageError> {
        let db = match config {
            StorageConfig::File(path) => {
                if let Some(dir) = path.parent() {
                    if !dir.as_os_str().is_empty() && !dir.exists() {
                        std::fs::create_dir_all(dir)?;
                    }
                }
                tracing::debug!(path = %path.display(), "opening log database");
                Database::create(path)?
            }
            StorageConfig::InMemory => {
                Database::builder().create_with_backend(InMemoryBackend::new())?
            }
        };
        Ok(Self { db: Arc::new(db) })
    }

    /// Wrap an already opened database.
    pub fn from_database(db: Database) -> Self {
        Self { db: Arc::new(db) }
    }

    /// Access the underlying redb database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Clone the shared connection handle.
    pub fn handle(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    /// Names of every table currently present in the database.
    pub fn table_names(&self) -> Result<Vec<String>, StorageError> {
        let txn = self.db.begin_read()?;
        let names = txn
            .list_tables()?
            .map(|table| table.name().to_string())
            .collect();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::TableDefinition;
    use tempfile::tempdir;

    const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("probe");

    #[test]
    fn test_in_memory_starts_empty() {
        let backend = StorageBackend::open(&StorageConfig::InMemory).unwrap();
        assert!(backend.table_names().unwrap().is_empty());
    }

    #[test]
    fn test_file_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("tracker.db");
        let _backend = StorageBackend::open(&StorageConfig::File(path.clone())).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_handles_share_database() {
        let backend = StorageBackend::open(&StorageConfig::InMemory).unwrap();
        let handle = backend.handle();

        let txn = handle.begin_write().unwrap();
        {
            let mut table = txn.open_table(TABLE).unwrap();
            table.insert(b"k".as_slice(), b"v".as_slice()).unwrap();
        }
        txn.commit().unwrap();

        assert_eq!(backend.table_names().unwrap(), vec!["probe".to_string()]);
    }
}
