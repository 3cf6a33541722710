//! MemTable implementation
//!
//! BTreeSet-based sorted container with an internal RwLock, so writers holding
//! the store's shared lock can mutate it concurrently.

use std::collections::BTreeSet;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::record::Record;

/// Sorted in-memory container of pending writes
///
/// Records are their own keys: inserting a record that compares equal to an
/// existing one replaces it. Size accounting is left to the owner, which gets
/// the replaced record back from [`MemTable::insert`].
#[derive(Debug)]
pub struct MemTable<R: Record> {
    data: RwLock<BTreeSet<R>>,
}

impl<R: Record> MemTable<R> {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeSet::new()),
        }
    }

    /// Insert or overwrite, returning the record that was replaced
    pub fn insert(&self, record: R) -> Option<R> {
        self.data.write().replace(record)
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Sum of the serialized sizes of every record (O(n), for checks and tests)
    pub fn serialized_size(&self) -> u64 {
        self.data.read().iter().map(Record::serialized_size).sum()
    }

    /// Smallest record
    pub fn first(&self) -> Option<R> {
        self.data.read().first().cloned()
    }

    /// First record >= `target` (tail view lookup, O(log n))
    pub fn ceiling(&self, target: &R) -> Option<R> {
        self.data
            .read()
            .range((Bound::Included(target), Bound::Unbounded))
            .next()
            .cloned()
    }

    /// First record strictly greater than `current` (O(log n))
    pub fn higher(&self, current: &R) -> Option<R> {
        self.data
            .read()
            .range((Bound::Excluded(current), Bound::Unbounded))
            .next()
            .cloned()
    }

    /// Copy out all records in ascending order
    pub fn to_vec(&self) -> Vec<R> {
        self.data.read().iter().cloned().collect()
    }
}

impl<R: Record> Default for MemTable<R> {
    fn default() -> Self {
        Self::new()
    }
}
