//! Run Files
//!
//! A run is the immutable, sorted on-disk image of one flushed snapshot.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "TDRN" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Data Block (variable)                                   │
//! │   encoded KeyValue, repeated in ascending order         │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (16 bytes)                                       │
//! │   DataEnd: u64 (8) | DataCRC: u32 (4) | Padding (4)     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//! All integers are big-endian.

mod iterator;
mod reader;
mod writer;

use std::path::PathBuf;

use bytes::Bytes;

pub use iterator::RunIter;
pub use reader::RunReader;
pub use writer::RunWriter;

// =============================================================================
// Shared Constants (used by writer, reader)
// =============================================================================

/// Magic bytes identifying a TideKV run file
pub(crate) const MAGIC: &[u8; 4] = b"TDRN";

/// Current run format version
pub(crate) const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + EntryCount (8) = 14 bytes
pub(crate) const HEADER_SIZE: u64 = 14;

/// Footer size: DataEnd (8) + DataCRC (4) + Padding (4) = 16 bytes
pub(crate) const FOOTER_SIZE: u64 = 16;

// =============================================================================
// Run Metadata
// =============================================================================

/// Summary of a finished run, returned by [`RunWriter::finish`]
#[derive(Debug, Clone)]
pub struct RunMeta {
    /// Path to the run file
    pub path: PathBuf,
    /// Number of records in this run
    pub entry_count: u64,
    /// Smallest key (for range filtering)
    pub min_key: Bytes,
    /// Largest key (for range filtering)
    pub max_key: Bytes,
    /// File size in bytes
    pub file_size: u64,
}
