//! Single-source adapter over one MemTable

use std::sync::Arc;

use crate::error::{Result, TideError};
use crate::memtable::MemTable;
use crate::record::Record;

use super::SeekIter;

/// Ascending cursor over one [`MemTable`]
///
/// Holds the next record eagerly so `has_next` is a plain field check. Every
/// step is a logarithmic lookup of the first record after the previous one,
/// so writers keep going while the cursor is alive; records they add behind
/// the cursor are simply not seen.
pub struct TableIter<R: Record> {
    table: Arc<MemTable<R>>,
    next: Option<R>,
}

impl<R: Record> TableIter<R> {
    /// Cursor positioned at the smallest record
    pub fn new(table: Arc<MemTable<R>>) -> Self {
        let next = table.first();
        Self { table, next }
    }
}

impl<R: Record> SeekIter<R> for TableIter<R> {
    fn has_next(&self) -> bool {
        self.next.is_some()
    }

    fn advance(&mut self) -> Result<R> {
        let current = self.next.take().ok_or(TideError::IteratorExhausted)?;
        self.next = self.table.higher(&current);
        Ok(current)
    }

    fn seek(&mut self, target: &R) -> Result<()> {
        self.next = self.table.ceiling(target);
        Ok(())
    }
}
