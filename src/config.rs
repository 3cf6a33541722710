//! Configuration for TideKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, TideError};

/// Main configuration for a TideKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for run files written by flushes
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // MemStore Configuration
    // -------------------------------------------------------------------------
    /// Size of the active memtable (in bytes) above which a flush is triggered
    pub max_memstore_size: u64,

    /// Maximum number of flush attempts for one snapshot
    pub flush_max_retries: u32,

    // -------------------------------------------------------------------------
    // Worker Pool Configuration
    // -------------------------------------------------------------------------
    /// Number of worker threads running flush tasks
    pub max_thread_pool_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./tidekv_data"),
            max_memstore_size: 16 * 1024 * 1024, // 16 MB
            flush_max_retries: 10,
            max_thread_pool_size: 5,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the flush coordinator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.flush_max_retries == 0 {
            return Err(TideError::Config(
                "flush_max_retries must allow at least one attempt".to_string(),
            ));
        }
        if self.max_thread_pool_size == 0 {
            return Err(TideError::Config(
                "max_thread_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for run files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the memstore flush threshold (in bytes)
    pub fn max_memstore_size(mut self, size: u64) -> Self {
        self.config.max_memstore_size = size;
        self
    }

    /// Set the maximum number of flush attempts per snapshot
    pub fn flush_max_retries(mut self, retries: u32) -> Self {
        self.config.flush_max_retries = retries;
        self
    }

    /// Set the number of flush worker threads
    pub fn max_thread_pool_size(mut self, size: usize) -> Self {
        self.config.max_thread_pool_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
