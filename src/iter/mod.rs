//! Iterator Module
//!
//! Restartable, seek-capable iteration over ordered record sources.
//!
//! ## Responsibilities
//! - `SeekIter`: the common cursor contract (peek, advance, seek)
//! - `TableIter`: one memtable as a source
//! - `MergeIter`: k-way merge of any number of sources into one ordered pass
//!
//! Run files in the storage layer implement `SeekIter` too, so the engine
//! merges memory and disk through the same machinery.

mod merge;
mod table_iter;

pub use merge::{BoxedSource, MergeIter};
pub use table_iter::TableIter;

use crate::error::Result;

/// Forward-only, finite, seekable cursor over ascending records
pub trait SeekIter<R> {
    /// Whether another record is available. Never moves the cursor.
    fn has_next(&self) -> bool;

    /// Return the next record. Fails with `IteratorExhausted` past the end.
    fn advance(&mut self) -> Result<R>;

    /// Reposition to the first record >= `target`
    fn seek(&mut self, target: &R) -> Result<()>;

    /// Drain everything left into a Vec
    fn collect_remaining(&mut self) -> Result<Vec<R>> {
        let mut out = Vec::new();
        while self.has_next() {
            out.push(self.advance()?);
        }
        Ok(out)
    }
}

impl<R, I: SeekIter<R> + ?Sized> SeekIter<R> for Box<I> {
    fn has_next(&self) -> bool {
        (**self).has_next()
    }

    fn advance(&mut self) -> Result<R> {
        (**self).advance()
    }

    fn seek(&mut self, target: &R) -> Result<()> {
        (**self).seek(target)
    }
}
