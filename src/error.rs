//! Error types for TideKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TideError
pub type Result<T> = std::result::Result<T, TideError>;

/// Unified error type for TideKV operations
#[derive(Debug, Error)]
pub enum TideError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// Malformed slice bounds or a buffer too short for the requested width
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Write Path Errors
    // -------------------------------------------------------------------------
    /// Backpressure rejection: the memstore is over its limit while a flush
    /// is still in flight. Callers should back off and retry.
    #[error(
        "Memstore is full, currentDataSize={size}B, maxMemstoreSize={limit}B, \
         please wait until the flushing is finished"
    )]
    Full { size: u64, limit: u64 },

    /// One failed flush attempt. Retried internally and logged, never
    /// returned to writers.
    #[error("Flush attempt {attempt}/{max} failed: {source}")]
    FlushAttempt {
        attempt: u32,
        max: u32,
        #[source]
        source: Box<TideError>,
    },

    // -------------------------------------------------------------------------
    // Iterator Errors
    // -------------------------------------------------------------------------
    #[error("Iterator advanced past its last record")]
    IteratorExhausted,

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Executor is shut down, task rejected")]
    ExecutorClosed,
}

impl TideError {
    /// True for the synchronous backpressure rejection
    pub fn is_full(&self) -> bool {
        matches!(self, TideError::Full { .. })
    }
}
