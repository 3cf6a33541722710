//! K-way merge
//!
//! Each source's current head sits in a binary heap; `advance` pops the
//! smallest and refills from the source it came from.
//!
//! ## Tie-break
//! Sources are passed newest first (active memtable, snapshot, runs from newest
//! to oldest). When two heads compare equal, the one from the lower source
//! index comes out first. Both records are still yielded; collapsing versions
//! is left to the reader.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Result, TideError};

use super::SeekIter;

/// Boxed source accepted by [`MergeIter`]
pub type BoxedSource<R> = Box<dyn SeekIter<R> + Send>;

struct HeapEntry<R> {
    record: R,
    source_idx: usize,
}

impl<R: Ord> PartialEq for HeapEntry<R> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<R: Ord> Eq for HeapEntry<R> {}

impl<R: Ord> Ord for HeapEntry<R> {
    // BinaryHeap is a max-heap: invert so the smallest record, then the
    // lowest source index, sits on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .record
            .cmp(&self.record)
            .then_with(|| other.source_idx.cmp(&self.source_idx))
    }
}

impl<R: Ord> PartialOrd for HeapEntry<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Globally ordered cursor over several individually ordered sources
pub struct MergeIter<R> {
    sources: Vec<BoxedSource<R>>,
    heap: BinaryHeap<HeapEntry<R>>,
}

impl<R: Ord> MergeIter<R> {
    /// Build a merge over `sources`, newest first
    pub fn new(sources: Vec<BoxedSource<R>>) -> Result<Self> {
        let mut iter = Self {
            heap: BinaryHeap::with_capacity(sources.len()),
            sources,
        };
        iter.fill_heap()?;
        Ok(iter)
    }

    /// Number of underlying sources
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn fill_heap(&mut self) -> Result<()> {
        self.heap.clear();
        for idx in 0..self.sources.len() {
            self.pull(idx)?;
        }
        Ok(())
    }

    /// Move the head of source `idx` into the heap, if it has one
    fn pull(&mut self, idx: usize) -> Result<()> {
        let source = &mut self.sources[idx];
        if source.has_next() {
            let record = source.advance()?;
            self.heap.push(HeapEntry {
                record,
                source_idx: idx,
            });
        }
        Ok(())
    }
}

impl<R: Ord> SeekIter<R> for MergeIter<R> {
    fn has_next(&self) -> bool {
        !self.heap.is_empty()
    }

    fn advance(&mut self) -> Result<R> {
        let top = self.heap.pop().ok_or(TideError::IteratorExhausted)?;
        // Keep the head queued if its source fails to refill
        if let Err(err) = self.pull(top.source_idx) {
            self.heap.push(top);
            return Err(err);
        }
        Ok(top.record)
    }

    fn seek(&mut self, target: &R) -> Result<()> {
        for source in &mut self.sources {
            source.seek(target)?;
        }
        self.fill_heap()
    }
}
