//! LogEntryStore - one stream's log records and checkpoint
//!
//! Key: `logs-` + index (8 bytes, big-endian) so key order is index order and
//! the tail of the log is the last key of the prefix range.

use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use redb::{Database, ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition};
use tracker_model::{Block, Codec, Log, TrackerEvent};

use crate::batch::{BatchSummary, LogBatch};
use crate::error::{BatchItem, LogStoreError, Phase, Subject};
use crate::keys::{self, CHECKPOINT_KEY, LOG_PREFIX, LOG_PREFIX_END};

pub(crate) type LogTableDef<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// Values of a batch after encoding, ready to be written.
struct EncodedBatch {
    truncate_from: Option<u64>,
    records: Vec<Vec<u8>>,
    checkpoint: Option<Vec<u8>>,
}

/// Handle onto a single log namespace.
///
/// Cheap to clone; clones share the database connection. Every method runs
/// in its own transaction, so reads from other threads see either all of a
/// batch or none of it.
#[derive(Clone)]
pub struct LogEntryStore {
    db: Arc<Database>,
    namespace: String,
}

impl std::fmt::Debug for LogEntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEntryStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl LogEntryStore {
    pub(crate) fn new(db: Arc<Database>, namespace: String) -> Self {
        Self { db, namespace }
    }

    /// Name of the backing table.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn definition(&self) -> LogTableDef<'_> {
        TableDefinition::new(&self.namespace)
    }

    // ==================== Reads ====================

    /// Last processed checkpoint, or `None` if none was ever written.
    pub fn checkpoint<C: Codec>(&self) -> Result<Option<C>, LogStoreError> {
        let txn = self.begin_read()?;
        let Some(table) = self.open_read(&txn)? else {
            return Ok(None);
        };
        let raw = table
            .get(CHECKPOINT_KEY)
            .map_err(|e| self.unavailable(Phase::Read, e))?;
        match raw {
            Some(raw) => C::decode(raw.value())
                .map(Some)
                .map_err(|e| self.corrupt(Subject::Checkpoint, e)),
            None => Ok(None),
        }
    }

    /// Decoded record at `index`.
    pub fn record<R: Codec>(&self, index: u64) -> Result<R, LogStoreError> {
        let raw = self.record_bytes(index)?;
        R::decode(&raw).map_err(|e| self.corrupt(Subject::Record(index), e))
    }

    /// Raw stored bytes of the record at `index`.
    pub fn record_bytes(&self, index: u64) -> Result<Vec<u8>, LogStoreError> {
        let txn = self.begin_read()?;
        let Some(table) = self.open_read(&txn)? else {
            return Err(self.not_found(index));
        };
        let key = keys::log_key(index);
        let raw = table
            .get(key.as_slice())
            .map_err(|e| self.unavailable(Phase::Read, e))?;
        raw.map(|v| v.value().to_vec())
            .ok_or_else(|| self.not_found(index))
    }

    /// Decoded records with indices in `range`, in index order.
    ///
    /// Indices past the tail are simply absent from the result.
    pub fn records<R: Codec>(&self, range: impl RangeBounds<u64>) -> Result<Vec<R>, LogStoreError> {
        let start = match range.start_bound() {
            Bound::Included(&start) => Some(start),
            Bound::Excluded(&start) => start.checked_add(1),
            Bound::Unbounded => Some(0),
        };
        let end = match range.end_bound() {
            Bound::Included(&end) => end.checked_add(1),
            Bound::Excluded(&end) => Some(end),
            Bound::Unbounded => None,
        };
        let Some(start) = start else {
            return Ok(Vec::new());
        };
        let lo = keys::log_key(start);
        let hi = match end {
            Some(end) => keys::log_key(end).to_vec(),
            None => LOG_PREFIX_END.to_vec(),
        };
        if lo.as_slice() >= hi.as_slice() {
            return Ok(Vec::new());
        }

        let txn = self.begin_read()?;
        let Some(table) = self.open_read(&txn)? else {
            return Ok(Vec::new());
        };
        let iter = table
            .range(lo.as_slice()..hi.as_slice())
            .map_err(|e| self.unavailable(Phase::Read, e))?;

        let mut records = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(|e| self.unavailable(Phase::Read, e))?;
            let index = self.index_of(key.value())?;
            let record = R::decode(value.value()).map_err(|e| self.corrupt(Subject::Record(index), e))?;
            records.push(record);
        }
        Ok(records)
    }

    /// Index the next appended record will get: last index + 1, or 0 when
    /// the log is empty.
    pub fn next_free_index(&self) -> Result<u64, LogStoreError> {
        let txn = self.begin_read()?;
        match self.open_read(&txn)? {
            Some(table) => self.next_free_index_in(&table),
            None => Ok(0),
        }
    }

    /// Tail lookup through the ordered index: the last key of the log prefix
    /// range, no scan.
    fn next_free_index_in<T>(&self, table: &T) -> Result<u64, LogStoreError>
    where
        T: ReadableTable<&'static [u8], &'static [u8]>,
    {
        let last = table
            .range(LOG_PREFIX..LOG_PREFIX_END)
            .map_err(|e| self.unavailable(Phase::Read, e))?
            .next_back()
            .transpose()
            .map_err(|e| self.unavailable(Phase::Read, e))?;
        match last {
            Some((key, _)) => Ok(self.index_of(key.value())? + 1),
            None => Ok(0),
        }
    }

    // ==================== Writes ====================

    /// Apply truncate, append and checkpoint in one write transaction.
    ///
    /// All values are encoded before the transaction begins, so an encoding
    /// failure leaves storage untouched. Any storage failure aborts the
    /// transaction, which rolls back every phase.
    pub fn apply_batch<R: Codec, C: Codec>(
        &self,
        batch: &LogBatch<R, C>,
    ) -> Result<BatchSummary, LogStoreError> {
        let encoded = self.encode(batch.truncation(), &batch.appended, batch.checkpoint.as_ref())?;
        self.write(encoded)
    }

    /// Persist one step of upstream tracking output.
    ///
    /// Rolls back from `event.index` (when non-zero), appends `event.added`
    /// and records `event.block` as the checkpoint.
    pub fn store_event(&self, event: &TrackerEvent) -> Result<BatchSummary, LogStoreError> {
        let encoded = self.encode::<Log, Block>(event.rollback_from(), &event.added, event.block.as_ref())?;
        self.write(encoded)
    }

    fn encode<R: Codec, C: Codec>(
        &self,
        truncate_from: Option<u64>,
        appended: &[R],
        checkpoint: Option<&C>,
    ) -> Result<EncodedBatch, LogStoreError> {
        let records = appended
            .iter()
            .enumerate()
            .map(|(position, record)| {
                record
                    .encode()
                    .map_err(|e| self.encoding(BatchItem::Record(position), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let checkpoint = checkpoint
            .map(|c| c.encode().map_err(|e| self.encoding(BatchItem::Checkpoint, e)))
            .transpose()?;
        Ok(EncodedBatch {
            truncate_from: truncate_from.filter(|&index| index > 0),
            records,
            checkpoint,
        })
    }

    fn write(&self, batch: EncodedBatch) -> Result<BatchSummary, LogStoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| self.unavailable(Phase::Begin, e))?;

        let summary = {
            let mut table = write_txn
                .open_table(self.definition())
                .map_err(|e| self.unavailable(Phase::Open, e))?;

            // 1. Truncate
            let removed = match batch.truncate_from {
                Some(from) => self.truncate(&mut table, from)?,
                None => 0,
            };

            // 2. Append at the tail as it stands after truncation
            let base = self.next_free_index_in(&table)?;
            for (offset, value) in batch.records.iter().enumerate() {
                let key = keys::log_key(base + offset as u64);
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(|e| self.unavailable(Phase::Append, e))?;
            }

            // 3. Checkpoint
            if let Some(value) = &batch.checkpoint {
                table
                    .insert(CHECKPOINT_KEY, value.as_slice())
                    .map_err(|e| self.unavailable(Phase::Checkpoint, e))?;
            }

            BatchSummary {
                removed,
                first_index: base,
                appended: batch.records.len() as u64,
                checkpoint_written: batch.checkpoint.is_some(),
            }
        };

        write_txn
            .commit()
            .map_err(|e| self.unavailable(Phase::Commit, e))?;

        tracing::debug!(
            namespace = %self.namespace,
            removed = summary.removed,
            first_index = summary.first_index,
            appended = summary.appended,
            checkpoint = summary.checkpoint_written,
            "log batch committed"
        );
        Ok(summary)
    }

    /// Delete every record in `[log_key(from), LOG_PREFIX_END)`.
    fn truncate(
        &self,
        table: &mut Table<'_, &'static [u8], &'static [u8]>,
        from: u64,
    ) -> Result<u64, LogStoreError> {
        let start = keys::log_key(from);
        let mut removed = 0u64;
        table
            .retain_in(start.as_slice()..LOG_PREFIX_END, |_, _| {
                removed += 1;
                false
            })
            .map_err(|e| self.unavailable(Phase::Truncate, e))?;
        Ok(removed)
    }

    // ==================== Helpers ====================

    fn begin_read(&self) -> Result<ReadTransaction, LogStoreError> {
        self.db
            .begin_read()
            .map_err(|e| self.unavailable(Phase::Begin, e))
    }

    /// Open the namespace table; `None` if it was never created.
    fn open_read(
        &self,
        txn: &ReadTransaction,
    ) -> Result<Option<ReadOnlyTable<&'static [u8], &'static [u8]>>, LogStoreError> {
        match txn.open_table(self.definition()) {
            Ok(table) => Ok(Some(table)),
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(self.unavailable(Phase::Open, e)),
        }
    }

    fn index_of(&self, key: &[u8]) -> Result<u64, LogStoreError> {
        keys::index_from_key(key).ok_or_else(|| {
            tracing::warn!(namespace = %self.namespace, key = ?key, "malformed log key");
            LogStoreError::CorruptData {
                namespace: self.namespace.clone(),
                subject: Subject::Key(key.to_vec()),
                source: tracker_model::CodecError::Invalid(format!(
                    "expected {} byte log key, got {} bytes",
                    keys::LOG_KEY_LEN,
                    key.len()
                )),
            }
        })
    }

    fn unavailable(&self, phase: Phase, source: impl Into<redb::Error>) -> LogStoreError {
        LogStoreError::unavailable(&self.namespace, phase, source)
    }

    fn not_found(&self, index: u64) -> LogStoreError {
        LogStoreError::NotFound {
            namespace: self.namespace.clone(),
            index,
        }
    }

    fn corrupt(&self, subject: Subject, source: tracker_model::CodecError) -> LogStoreError {
        tracing::warn!(namespace = %self.namespace, %subject, error = %source, "stored value failed to decode");
        LogStoreError::CorruptData {
            namespace: self.namespace.clone(),
            subject,
            source,
        }
    }

    fn encoding(&self, item: BatchItem, source: tracker_model::CodecError) -> LogStoreError {
        LogStoreError::Encoding {
            namespace: self.namespace.clone(),
            item,
            source,
        }
    }
}
