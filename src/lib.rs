//! # TideKV
//!
//! The write path of an embeddable LSM-style key-value store:
//! - A sorted in-memory memtable with exact size accounting
//! - Atomic snapshot and single-flight background flush with bounded retries
//! - Fail-fast backpressure while a flush is in flight
//! - Seekable k-way merge iterators over memory and on-disk runs
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │              (sequence numbers, get / scan)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       MemStore                              │
//! │   active MemTable ──swap──► snapshot      FlushState        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ flush task (FlushPool)
//!                       ▼
//!               ┌───────────────┐        ┌────────────────┐
//!               │   RunStore    │◄───────│   MergeIter    │
//!               │  (run files)  │  seek  │ (k-way, reads) │
//!               └───────────────┘        └────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod encoding;
pub mod error;
pub mod record;

pub mod engine;
pub mod executor;
pub mod iter;
pub mod memtable;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::Engine;
pub use error::{Result, TideError};
pub use iter::SeekIter;
pub use memtable::{FlushSink, FlushState, MemStore};
pub use record::{KeyValue, Op, Record};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TideKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
