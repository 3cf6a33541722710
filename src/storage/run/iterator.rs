//! Run Iterator
//!
//! Cursor over a decoded run; `seek` is a binary search.

use std::sync::Arc;

use crate::error::{Result, TideError};
use crate::iter::SeekIter;
use crate::record::KeyValue;

/// Iterator over run records in ascending order
pub struct RunIter {
    records: Arc<[KeyValue]>,
    /// Index of the next record to yield
    pos: usize,
}

impl RunIter {
    pub(super) fn new(records: Arc<[KeyValue]>) -> Self {
        Self { records, pos: 0 }
    }
}

impl SeekIter<KeyValue> for RunIter {
    fn has_next(&self) -> bool {
        self.pos < self.records.len()
    }

    fn advance(&mut self) -> Result<KeyValue> {
        let record = self
            .records
            .get(self.pos)
            .cloned()
            .ok_or(TideError::IteratorExhausted)?;
        self.pos += 1;
        Ok(record)
    }

    fn seek(&mut self, target: &KeyValue) -> Result<()> {
        self.pos = self.records.partition_point(|kv| kv < target);
        Ok(())
    }
}
