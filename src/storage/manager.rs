//! Run Store
//!
//! Manages the run files produced by memstore flushes.
//!
//! ## Responsibilities
//! - Discover existing runs on startup
//! - Write each flushed snapshot as a new run (the memstore's `FlushSink`)
//! - Hand out run iterators, newest first, for merged reads

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::Result;
use crate::iter::{BoxedSource, SeekIter};
use crate::memtable::FlushSink;
use crate::record::KeyValue;

use super::run::{RunReader, RunWriter};

/// Manages the run files in one directory
///
/// ## Concurrency:
/// - `runs`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_run_id`: Atomic counter (lock-free)
/// - All methods use `&self` (no exclusive access needed)
pub struct RunStore {
    /// Directory where runs are stored
    data_dir: PathBuf,

    /// Open run readers, ordered newest → oldest
    runs: RwLock<Vec<RunReader>>,

    /// Next ID for creating new runs (atomic, lock-free)
    next_run_id: AtomicU64,
}

impl RunStore {
    const RUN_EXTENSION: &'static str = "run";
    const TMP_EXTENSION: &'static str = "tmp";

    /// Open or create run storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Discover existing run files, dropping leftover temp files
    /// 3. Open readers for each, newest first
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut run_ids: Vec<u64> = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }

            if file_path.extension().is_some_and(|ext| ext == Self::TMP_EXTENSION) {
                tracing::debug!("Removing partial run {}", file_path.display());
                fs::remove_file(&file_path)?;
                continue;
            }

            if let Some(id) = Self::parse_run_id(&file_path) {
                run_ids.push(id);
            }
        }

        // Sort newest first (highest ID first)
        run_ids.sort_unstable_by(|a, b| b.cmp(a));

        let mut runs = Vec::with_capacity(run_ids.len());
        for id in &run_ids {
            runs.push(RunReader::open(&Self::run_path_with_dir(path, *id))?);
        }

        let next_id = run_ids.first().map(|&id| id + 1).unwrap_or(1);

        tracing::debug!(runs = runs.len(), next_id, "Run store opened");

        Ok(Self {
            data_dir: path.to_path_buf(),
            runs: RwLock::new(runs),
            next_run_id: AtomicU64::new(next_id),
        })
    }

    /// Iterators over every run, newest first
    pub fn sources(&self) -> Vec<BoxedSource<KeyValue>> {
        self.runs
            .read()
            .iter()
            .map(|run| Box::new(run.iter()) as BoxedSource<KeyValue>)
            .collect()
    }

    /// Get the number of runs
    pub fn run_count(&self) -> usize {
        self.runs.read().len()
    }

    /// Total records across all runs
    pub fn entry_count(&self) -> u64 {
        self.runs.read().iter().map(RunReader::entry_count).sum()
    }

    /// Highest sequence number persisted in any run
    pub fn max_sequence(&self) -> u64 {
        self.runs
            .read()
            .iter()
            .map(RunReader::max_sequence)
            .max()
            .unwrap_or(0)
    }

    /// Whether any run's key range covers `key`
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.runs.read().iter().any(|run| run.might_contain(key))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next run ID (for testing/debugging)
    pub fn next_run_id(&self) -> u64 {
        self.next_run_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Write all records to `<id>.tmp`, then rename into place
    fn write_run(&self, records: &mut dyn SeekIter<KeyValue>) -> Result<Option<RunReader>> {
        let id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let final_path = Self::run_path_with_dir(&self.data_dir, id);
        let tmp_path = final_path.with_extension(Self::TMP_EXTENSION);

        let result = (|| -> Result<Option<RunReader>> {
            let mut writer = RunWriter::new(&tmp_path)?;
            while records.has_next() {
                writer.add(&records.advance()?)?;
            }
            if writer.entry_count() == 0 {
                return Ok(None);
            }
            let meta = writer.finish()?;
            fs::rename(&tmp_path, &final_path)?;
            tracing::debug!(
                run = id,
                entries = meta.entry_count,
                bytes = meta.file_size,
                "Run written"
            );
            RunReader::open(&final_path).map(Some)
        })();

        // Best effort: a retried flush writes a fresh run under a new ID
        match &result {
            Ok(Some(_)) => {}
            Ok(None) => {
                let _ = fs::remove_file(&tmp_path);
            }
            Err(e) => {
                tracing::warn!(run = id, "Discarding failed run: {}", e);
                let _ = fs::remove_file(&tmp_path);
                let _ = fs::remove_file(&final_path);
            }
        }
        result
    }

    /// Generate run path given a directory and ID
    fn run_path_with_dir(dir: &Path, id: u64) -> PathBuf {
        dir.join(format!("run_{:06}.{}", id, Self::RUN_EXTENSION))
    }

    /// Parse run ID from filename
    /// "run_000042.run" → Some(42)
    fn parse_run_id(path: &Path) -> Option<u64> {
        if path.extension()? != Self::RUN_EXTENSION {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy();
        let id_str = name.strip_prefix("run_")?;
        id_str.parse().ok()
    }
}

impl FlushSink<KeyValue> for RunStore {
    /// Persist a snapshot as a new run. Empty snapshots produce no file.
    fn flush(&self, records: &mut dyn SeekIter<KeyValue>) -> Result<()> {
        if let Some(reader) = self.write_run(records)? {
            self.runs.write().insert(0, reader);
        }
        Ok(())
    }
}
