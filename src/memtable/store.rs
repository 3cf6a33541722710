//! MemStore: active memtable, snapshot and flush coordination
//!
//! ## Write path
//! 1. Pre-check: over the limit while a flush is in flight → `Full`
//! 2. Shared lock, insert into the active table, adjust the size counter
//! 3. Post-check: over the limit and idle → claim the flush and submit it
//!
//! ## Flush task
//! 1. Exclusive lock: active becomes the snapshot, a fresh table replaces it,
//!    size drops to zero. The lock is released before any I/O.
//! 2. Hand the snapshot to the sink, up to `flush_max_retries` attempts
//! 3. Success: drop the snapshot, back to `Idle`. Otherwise stay `Stuck`.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::encoding::human_size;
use crate::error::{Result, TideError};
use crate::executor::TaskExecutor;
use crate::iter::{BoxedSource, MergeIter, SeekIter, TableIter};
use crate::record::Record;

use super::state::{FlushFlag, FlushState};
use super::MemTable;

/// Durable destination for flushed snapshots
///
/// Implementations must tolerate being called again with the same snapshot
/// after a failed attempt.
pub trait FlushSink<R>: Send + Sync {
    /// Persist every record yielded by `records` (ascending order)
    fn flush(&self, records: &mut dyn SeekIter<R>) -> Result<()>;
}

/// Container handles swapped under the store's RwLock
struct Tables<R: Record> {
    active: Arc<MemTable<R>>,
    snapshot: Option<Arc<MemTable<R>>>,
}

struct Inner<R: Record> {
    /// Flush threshold in bytes
    max_size: u64,
    /// Attempts per snapshot before giving up
    max_retries: u32,

    /// Serialized size of the active table
    data_size: AtomicU64,

    /// Shared for inserts, exclusive for the swap and snapshot release
    tables: RwLock<Tables<R>>,

    state: FlushFlag,
    flushes_completed: AtomicU64,

    sink: Arc<dyn FlushSink<R>>,
    executor: Arc<dyn TaskExecutor>,
}

/// In-memory write buffer with single-flight background flushing
///
/// Cheap to clone; clones share the same tables.
///
/// ## Concurrency:
/// - `put` never blocks on a flush: it succeeds or fails with `Full`
/// - Size checks are lock-free and only eventually consistent, so a flush may
///   start one write early or late relative to the exact threshold
pub struct MemStore<R: Record> {
    inner: Arc<Inner<R>>,
}

impl<R: Record> Clone for MemStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Record> MemStore<R> {
    /// Create an empty, idle memstore
    pub fn new(
        config: &Config,
        sink: Arc<dyn FlushSink<R>>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                max_size: config.max_memstore_size,
                max_retries: config.flush_max_retries,
                data_size: AtomicU64::new(0),
                tables: RwLock::new(Tables {
                    active: Arc::new(MemTable::new()),
                    snapshot: None,
                }),
                state: FlushFlag::new(),
                flushes_completed: AtomicU64::new(0),
                sink,
                executor,
            }),
        })
    }

    /// Insert or overwrite a record
    ///
    /// Fails with `Full` when the active table is already over the limit and a
    /// flush is in flight (including a stuck one).
    pub fn put(&self, record: R) -> Result<()> {
        self.inner.check_backpressure()?;

        {
            let tables = self.inner.tables.read();
            let new_size = record.serialized_size();
            match tables.active.insert(record) {
                None => {
                    self.inner.data_size.fetch_add(new_size, Ordering::AcqRel);
                }
                Some(prev) => {
                    let old_size = prev.serialized_size();
                    if new_size >= old_size {
                        self.inner
                            .data_size
                            .fetch_add(new_size - old_size, Ordering::AcqRel);
                    } else {
                        self.inner
                            .data_size
                            .fetch_sub(old_size - new_size, Ordering::AcqRel);
                    }
                }
            }
        }

        Inner::maybe_schedule_flush(&self.inner);
        Ok(())
    }

    /// Flush the active table now, whatever its size
    ///
    /// Returns false when the table is empty, a flush is already in flight,
    /// or the executor refused the task.
    pub fn request_flush(&self) -> bool {
        if self.inner.tables.read().active.is_empty() {
            return false;
        }
        Inner::schedule_flush(&self.inner)
    }

    /// Point-in-time merged view over the active table and the snapshot
    ///
    /// The set of tables is fixed when the iterator is created; a later swap
    /// does not add the fresh active table to it.
    pub fn iter(&self) -> Result<MergeIter<R>> {
        let tables = self.inner.tables.read();
        let mut sources: Vec<BoxedSource<R>> = Vec::with_capacity(2);
        sources.push(Box::new(TableIter::new(Arc::clone(&tables.active))));
        if let Some(snapshot) = &tables.snapshot {
            sources.push(Box::new(TableIter::new(Arc::clone(snapshot))));
        }
        drop(tables);
        MergeIter::new(sources)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Tracked serialized size of the active table
    pub fn data_size(&self) -> u64 {
        self.inner.data_size.load(Ordering::Acquire)
    }

    /// Flush threshold in bytes
    pub fn max_size(&self) -> u64 {
        self.inner.max_size
    }

    pub fn flush_state(&self) -> FlushState {
        self.inner.state.load()
    }

    /// True while a flush is claimed, running or stuck
    pub fn is_flushing(&self) -> bool {
        self.flush_state().in_flight()
    }

    /// Records in the active table
    pub fn active_len(&self) -> usize {
        self.inner.tables.read().active.len()
    }

    /// Records in the snapshot, if one is held
    pub fn snapshot_len(&self) -> Option<usize> {
        self.inner
            .tables
            .read()
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.len())
    }

    /// Number of snapshots successfully handed to the sink
    pub fn flushes_completed(&self) -> u64 {
        self.inner.flushes_completed.load(Ordering::Acquire)
    }
}

impl<R: Record> Inner<R> {
    fn over_limit(&self) -> bool {
        self.data_size.load(Ordering::Acquire) > self.max_size
    }

    fn check_backpressure(&self) -> Result<()> {
        if self.over_limit() && self.state.load().in_flight() {
            return Err(TideError::Full {
                size: self.data_size.load(Ordering::Acquire),
                limit: self.max_size,
            });
        }
        Ok(())
    }

    /// Claim and submit a flush if over the limit; losers of the claim do nothing
    fn maybe_schedule_flush(this: &Arc<Self>) {
        if this.over_limit() {
            Self::schedule_flush(this);
        }
    }

    fn schedule_flush(this: &Arc<Self>) -> bool {
        if !this.state.transition(FlushState::Idle, FlushState::Snapshotting) {
            return false;
        }

        let inner = Arc::clone(this);
        if let Err(e) = this.executor.execute(Box::new(move || inner.run_flush())) {
            this.state
                .transition(FlushState::Snapshotting, FlushState::Idle);
            tracing::warn!("Could not submit memstore flush: {}", e);
            return false;
        }
        true
    }

    fn run_flush(&self) {
        let (snapshot, snapshot_size) = {
            let mut tables = self.tables.write();
            let fresh = Arc::new(MemTable::new());
            let snapshot = mem::replace(&mut tables.active, fresh);
            tables.snapshot = Some(Arc::clone(&snapshot));
            let size = self.data_size.swap(0, Ordering::AcqRel);
            (snapshot, size)
        };
        self.state
            .transition(FlushState::Snapshotting, FlushState::Flushing);

        tracing::info!(
            records = snapshot.len(),
            size = %human_size(snapshot_size),
            "Memstore snapshot taken, flushing"
        );

        for attempt in 1..=self.max_retries {
            let mut records = TableIter::new(Arc::clone(&snapshot));
            match self.sink.flush(&mut records) {
                Ok(()) => {
                    self.tables.write().snapshot = None;
                    self.flushes_completed.fetch_add(1, Ordering::AcqRel);
                    self.state.transition(FlushState::Flushing, FlushState::Idle);
                    tracing::info!(attempt, "Memstore snapshot flushed");
                    return;
                }
                Err(e) => {
                    let err = TideError::FlushAttempt {
                        attempt,
                        max: self.max_retries,
                        source: Box::new(e),
                    };
                    tracing::error!("Failed to flush memstore: {}", err);
                }
            }
        }

        self.state.transition(FlushState::Flushing, FlushState::Stuck);
        tracing::error!(
            retries = self.max_retries,
            records = snapshot.len(),
            "Memstore flush retries exhausted, snapshot retained and writes will be rejected"
        );
    }
}
