//! Storage Module
//!
//! File-backed destination for memstore flushes.
//!
//! ## Responsibilities
//! - Persist each flushed snapshot as an immutable sorted run
//! - Checksums to detect torn or corrupted runs
//! - Rediscover runs after restart
//! - Expose runs as seekable merge participants
//!
//! Compaction of runs is out of scope; runs accumulate until an external
//! process merges them.

mod manager;
pub mod run;

pub use manager::RunStore;
pub use run::{RunIter, RunMeta, RunReader, RunWriter};
