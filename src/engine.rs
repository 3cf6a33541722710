//! Engine Module
//!
//! Wires the memstore, the run store and the flush pool together.
//!
//! ## Responsibilities
//! - Assign sequence numbers to writes
//! - Route writes into the memstore (flushes happen in the background)
//! - Answer point reads and scans through one merged view of memory and runs
//! - Recover the sequence counter from runs on startup

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::error::{Result, TideError};
use crate::executor::FlushPool;
use crate::iter::{BoxedSource, MergeIter, SeekIter};
use crate::memtable::{FlushState, MemStore};
use crate::record::KeyValue;
use crate::storage::RunStore;

/// The embeddable storage engine
///
/// ## Concurrency Model
///
/// - **Writes** (put/delete): lock-free sequence assignment, then the
///   memstore's shared lock. Writers never wait for a flush; when the memstore
///   is full and a flush is in flight they get `TideError::Full` back.
/// - **Reads** (get/scan): build a merged iterator over the memstore tables
///   and every run. No engine-level lock.
/// - **Flushes**: run on the `FlushPool`, one at a time.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// In-memory write buffer with background flushing
    memstore: MemStore<KeyValue>,

    /// Flushed runs (also the memstore's flush sink)
    storage: Arc<RunStore>,

    /// Workers executing flush tasks
    pool: Arc<FlushPool>,

    /// Last sequence number handed out
    sequence: AtomicU64,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const RUN_DIR: &'static str = "runs";
    const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(5);

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Validate config, create data directory
    /// 2. Load existing runs
    /// 3. Resume sequence numbers after the highest persisted one
    /// 4. Start the flush pool
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let storage = Arc::new(RunStore::open(&config.data_dir.join(Self::RUN_DIR))?);
        let last_sequence = storage.max_sequence();

        let pool = Arc::new(FlushPool::new(config.max_thread_pool_size)?);
        let memstore = MemStore::new(&config, storage.clone(), pool.clone())?;

        tracing::info!(
            data_dir = %config.data_dir.display(),
            runs = storage.run_count(),
            last_sequence,
            "Engine opened"
        );

        Ok(Self {
            config,
            memstore,
            storage,
            pool,
            sequence: AtomicU64::new(last_sequence),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Put a key-value pair
    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) -> Result<()> {
        let sequence = self.next_sequence();
        self.memstore.put(KeyValue::put(key, value, sequence))
    }

    /// Delete a key (writes a tombstone)
    pub fn delete(&self, key: impl Into<Bytes>) -> Result<()> {
        let sequence = self.next_sequence();
        self.memstore.put(KeyValue::delete(key, sequence))
    }

    /// Get the newest value of `key`
    ///
    /// Seeks the merged view to the newest possible version of the key; the
    /// first record found decides (tombstone → `None`).
    pub fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let key = Bytes::copy_from_slice(key);
        let mut iter = self.merged()?;
        iter.seek(&KeyValue::seek_key(key.clone()))?;

        if !iter.has_next() {
            return Ok(None);
        }
        let found = iter.advance()?;
        if found.key() != &key || found.is_tombstone() {
            return Ok(None);
        }
        Ok(Some(found.value().clone()))
    }

    /// Ordered scan of live keys, newest value per key
    pub fn scan(&self) -> Result<Scan> {
        Ok(Scan::new(self.merged()?))
    }

    /// Ordered scan starting at the first key >= `start`
    pub fn scan_from(&self, start: &[u8]) -> Result<Scan> {
        let mut iter = self.merged()?;
        iter.seek(&KeyValue::seek_key(Bytes::copy_from_slice(start)))?;
        Ok(Scan::new(iter))
    }

    /// Ask for a flush of the memstore regardless of its size
    ///
    /// Returns immediately; false if nothing was scheduled.
    pub fn flush(&self) -> bool {
        self.memstore.request_flush()
    }

    /// Close the engine gracefully
    ///
    /// Keeps requesting flushes until the memstore is empty (or stuck), then
    /// drains the flush pool. Fails if data is still held in memory.
    pub fn close(self) -> Result<()> {
        loop {
            match self.memstore.flush_state() {
                FlushState::Stuck => break,
                FlushState::Idle if self.memstore.active_len() == 0 => break,
                _ => {
                    if !self.memstore.request_flush() {
                        thread::sleep(Self::CLOSE_POLL_INTERVAL);
                    }
                }
            }
        }
        self.pool.shutdown();

        let state = self.memstore.flush_state();
        let pending = self.memstore.active_len() + self.memstore.snapshot_len().unwrap_or(0);
        if pending > 0 {
            tracing::error!(%state, pending, "Engine closed with unflushed records");
            return Err(TideError::Storage(format!(
                "{} records not flushed (flush state: {})",
                pending, state
            )));
        }

        tracing::info!("Engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the memstore
    pub fn memstore(&self) -> &MemStore<KeyValue> {
        &self.memstore
    }

    /// Get the current memstore size
    pub fn memstore_size(&self) -> u64 {
        self.memstore.data_size()
    }

    /// Current flush state of the memstore
    pub fn flush_state(&self) -> FlushState {
        self.memstore.flush_state()
    }

    /// Get the number of runs
    pub fn run_count(&self) -> usize {
        self.storage.run_count()
    }

    /// Last sequence number handed out
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Memstore tables first, then runs newest to oldest.
    ///
    /// The memstore view must be taken before the run list: a flush publishes
    /// its run before releasing the snapshot, so this order never misses data
    /// (at worst a record shows up twice and the scan collapses it).
    fn merged(&self) -> Result<MergeIter<KeyValue>> {
        let mut sources: Vec<BoxedSource<KeyValue>> = Vec::new();
        sources.push(Box::new(self.memstore.iter()?));
        sources.extend(self.storage.sources());
        MergeIter::new(sources)
    }
}

/// Ordered scan over live keys
///
/// Collapses versions: only the newest record of each key is considered, and
/// keys whose newest record is a tombstone are skipped.
pub struct Scan {
    iter: MergeIter<KeyValue>,
    last_key: Option<Bytes>,
}

impl Scan {
    fn new(iter: MergeIter<KeyValue>) -> Self {
        Self {
            iter,
            last_key: None,
        }
    }
}

impl Iterator for Scan {
    type Item = Result<(Bytes, Bytes)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.iter.has_next() {
            let record = match self.iter.advance() {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };

            // Older version of a key already decided
            if self.last_key.as_ref() == Some(record.key()) {
                continue;
            }
            self.last_key = Some(record.key().clone());

            if record.is_tombstone() {
                continue;
            }
            return Some(Ok((record.key().clone(), record.value().clone())));
        }
        None
    }
}
