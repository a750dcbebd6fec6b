/// One atomic update of a log namespace.
///
/// Applied in order: drop every record at or above `truncate_from`, append
/// `appended` at the post-truncation tail, overwrite the checkpoint. A
/// `truncate_from` of `None` or `Some(0)` does not truncate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBatch<R, C> {
    pub truncate_from: Option<u64>,
    pub appended: Vec<R>,
    pub checkpoint: Option<C>,
}

impl<R, C> Default for LogBatch<R, C> {
    fn default() -> Self {
        Self {
            truncate_from: None,
            appended: Vec::new(),
            checkpoint: None,
        }
    }
}

impl<R, C> LogBatch<R, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn truncate_from(mut self, index: u64) -> Self {
        self.truncate_from = Some(index);
        self
    }

    pub fn append(mut self, record: R) -> Self {
        self.appended.push(record);
        self
    }

    pub fn extend(mut self, records: impl IntoIterator<Item = R>) -> Self {
        self.appended.extend(records);
        self
    }

    pub fn checkpoint(mut self, checkpoint: C) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Effective truncation boundary. Zero is the same as no truncation.
    pub fn truncation(&self) -> Option<u64> {
        self.truncate_from.filter(|&index| index > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.truncation().is_none() && self.appended.is_empty() && self.checkpoint.is_none()
    }
}

/// What a committed batch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Records deleted by truncation.
    pub removed: u64,
    /// Index the first appended record was written at.
    pub first_index: u64,
    pub appended: u64,
    pub checkpoint_written: bool,
}

impl BatchSummary {
    /// Next free index after the batch committed.
    pub fn next_free_index(&self) -> u64 {
        self.first_index + self.appended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_truncation_is_none() {
        let batch: LogBatch<Vec<u8>, Vec<u8>> = LogBatch::new().truncate_from(0);
        assert_eq!(batch.truncation(), None);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_builder_keeps_order() {
        let batch: LogBatch<u8, ()> = LogBatch::new().append(1).extend([2, 3]).truncate_from(4);
        assert_eq!(batch.appended, vec![1, 2, 3]);
        assert_eq!(batch.truncation(), Some(4));
        assert!(!batch.is_empty());
    }
}
