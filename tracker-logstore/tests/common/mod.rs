#![allow(dead_code)]

use redb::{ReadableTable, TableDefinition};
use tempfile::TempDir;
use tracker_logstore::{LogEntryStore, NamespaceResolver};
use tracker_model::{Codec, CodecError};
use tracker_storage::{StorageBackend, StorageConfig};

/// A resolved default namespace plus everything needed to keep it alive.
pub struct TestStore {
    pub backend: StorageBackend,
    pub resolver: NamespaceResolver,
    pub store: LogEntryStore,
    pub _dir: Option<TempDir>,
}

impl TestStore {
    pub fn in_memory() -> Self {
        Self::open(StorageConfig::InMemory, None)
    }

    pub fn file() -> Self {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig::File(dir.path().join("tracker.db"));
        Self::open(config, Some(dir))
    }

    fn open(config: StorageConfig, dir: Option<TempDir>) -> Self {
        let backend = StorageBackend::open(&config).expect("failed to open backend");
        let resolver = NamespaceResolver::new(&backend);
        let store = resolver.resolve("").expect("failed to resolve namespace");
        Self {
            backend,
            resolver,
            store,
            _dir: dir,
        }
    }

    /// Every key/value pair in the namespace table, in key order.
    pub fn dump(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let def = TableDefinition::<&[u8], &[u8]>::new(self.store.namespace());
        let read_txn = self.backend.db().begin_read().unwrap();
        let table = read_txn.open_table(def).unwrap();
        table
            .iter()
            .unwrap()
            .map(|entry| {
                let (k, v) = entry.unwrap();
                (k.value().to_vec(), v.value().to_vec())
            })
            .collect()
    }
}

/// Run the same check against the in-memory and the file backend.
pub fn for_each_backend(check: impl Fn(&TestStore)) {
    check(&TestStore::in_memory());
    check(&TestStore::file());
}

/// Text record whose encoding fails for the value `"poison"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry(pub String);

impl Entry {
    pub fn new(s: impl Into<String>) -> Self {
        Entry(s.into())
    }

    pub fn poison() -> Self {
        Entry::new("poison")
    }
}

impl Codec for Entry {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.0 == "poison" {
            return Err(CodecError::Invalid("poisoned entry".into()));
        }
        Ok(self.0.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        String::from_utf8(bytes.to_vec())
            .map(Entry)
            .map_err(|e| CodecError::Invalid(e.to_string()))
    }
}

pub fn entries(values: &[&str]) -> Vec<Entry> {
    values.iter().map(|v| Entry::new(*v)).collect()
}
