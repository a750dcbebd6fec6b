//! Maps stream ids onto isolated log namespaces.

use std::sync::Arc;

use redb::{Database, TableHandle};
use tracker_storage::StorageBackend;

use crate::error::{LogStoreError, Phase};
use crate::keys;
use crate::store::{LogEntryStore, LogTableDef};

/// Resolves stream ids to [`LogEntryStore`] handles on a shared database.
#[derive(Clone)]
pub struct NamespaceResolver {
    db: Arc<Database>,
}

impl std::fmt::Debug for NamespaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceResolver").finish_non_exhaustive()
    }
}

impl NamespaceResolver {
    pub fn new(backend: &StorageBackend) -> Self {
        Self { db: backend.handle() }
    }

    pub fn from_database(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Open the namespace for `stream_id`, creating it if absent.
    ///
    /// Idempotent: resolving the same id again yields a handle onto the
    /// same data.
    pub fn resolve(&self, stream_id: &str) -> Result<LogEntryStore, LogStoreError> {
        let namespace = keys::namespace_name(stream_id);
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| LogStoreError::unavailable(&namespace, Phase::Begin, e))?;

        let created = {
            let existed = write_txn
                .list_tables()
                .map_err(|e| LogStoreError::unavailable(&namespace, Phase::Open, e))?
                .any(|table| table.name() == namespace);
            write_txn
                .open_table(LogTableDef::new(&namespace))
                .map_err(|e| LogStoreError::unavailable(&namespace, Phase::Open, e))?;
            !existed
        };

        write_txn
            .commit()
            .map_err(|e| LogStoreError::unavailable(&namespace, Phase::Commit, e))?;

        if created {
            tracing::info!(namespace = %namespace, "created log namespace");
        }
        Ok(LogEntryStore::new(Arc::clone(&self.db), namespace))
    }

    /// Stream ids of every namespace present in the database.
    pub fn streams(&self) -> Result<Vec<String>, LogStoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| LogStoreError::unavailable(keys::NAMESPACE_PREFIX, Phase::Begin, e))?;
        let streams = read_txn
            .list_tables()
            .map_err(|e| LogStoreError::unavailable(keys::NAMESPACE_PREFIX, Phase::Read, e))?
            .filter_map(|table| keys::stream_id(table.name()).map(str::to_string))
            .collect();
        Ok(streams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_storage::StorageConfig;

    #[test]
    fn test_resolve_creates_table() {
        let backend = StorageBackend::open(&StorageConfig::InMemory).unwrap();
        let resolver = NamespaceResolver::new(&backend);

        let store = resolver.resolve("").unwrap();
        assert_eq!(store.namespace(), "logs");
        assert_eq!(backend.table_names().unwrap(), vec!["logs".to_string()]);
    }

    #[test]
    fn test_streams_lists_resolved_ids() {
        let backend = StorageBackend::open(&StorageConfig::InMemory).unwrap();
        let resolver = NamespaceResolver::new(&backend);

        resolver.resolve("b").unwrap();
        resolver.resolve("a").unwrap();
        resolver.resolve("a").unwrap();

        let mut streams = resolver.streams().unwrap();
        streams.sort();
        assert_eq!(streams, vec!["a".to_string(), "b".to_string()]);
    }
}
