//! Run Reader
//!
//! Loads a run file into memory after validating header, footer and checksum.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::encoding::{compare_bytes, decode_u32, decode_u64, slice};
use crate::error::Result;
use crate::record::{KeyValue, KV_OVERHEAD};
use crate::TideError;

use super::iterator::RunIter;
use super::{FOOTER_SIZE, HEADER_SIZE, MAGIC, VERSION};

/// Open, validated run file
///
/// Runs are memstore-sized, so the whole data block is decoded once and
/// shared by every iterator.
#[derive(Debug, Clone)]
pub struct RunReader {
    path: PathBuf,
    records: Arc<[KeyValue]>,
}

impl RunReader {
    /// Open a run for reading
    pub fn open(path: &Path) -> Result<Self> {
        let buf = fs::read(path)?;
        let file_size = buf.len() as u64;

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(TideError::Corruption(format!(
                "Run file {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        // Header
        if &buf[0..4] != MAGIC {
            return Err(TideError::Corruption(format!(
                "Invalid run magic: expected TDRN, got {:?}",
                &buf[0..4]
            )));
        }

        let version = u16::from_be_bytes([buf[4], buf[5]]);
        if version != VERSION {
            return Err(TideError::Storage(format!(
                "Unsupported run version: {}",
                version
            )));
        }

        let entry_count = decode_u64(&buf[6..14])?;

        // Footer
        let footer = slice(&buf, (file_size - FOOTER_SIZE) as i64, FOOTER_SIZE as i64)?;
        let data_end = decode_u64(&footer[0..8])?;
        let data_crc = decode_u32(&footer[8..12])?;

        if data_end < HEADER_SIZE || data_end > file_size - FOOTER_SIZE {
            return Err(TideError::Corruption(format!(
                "Run data end {} outside file of {} bytes",
                data_end, file_size
            )));
        }

        let data = &buf[HEADER_SIZE as usize..data_end as usize];
        if crc32fast::hash(data) != data_crc {
            return Err(TideError::Corruption(format!(
                "Run {} failed checksum",
                path.display()
            )));
        }

        // Data block; the header count is unchecked until the block is parsed
        let max_records = data.len() / KV_OVERHEAD as usize;
        let mut records = Vec::with_capacity(max_records.min(entry_count as usize));
        let mut pos = 0;
        while pos < data.len() {
            let (record, consumed) = KeyValue::parse_from(data, pos)?;
            records.push(record);
            pos += consumed;
        }

        if records.len() as u64 != entry_count {
            return Err(TideError::Corruption(format!(
                "Run header claims {} records, found {}",
                entry_count,
                records.len()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            records: records.into(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Get the minimum key in this run (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.records.first().map(|kv| kv.key().as_ref())
    }

    /// Get the maximum key in this run (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.records.last().map(|kv| kv.key().as_ref())
    }

    /// Highest sequence number in this run (0 when empty)
    pub fn max_sequence(&self) -> u64 {
        self.records
            .iter()
            .map(KeyValue::sequence)
            .max()
            .unwrap_or(0)
    }

    /// Quick check if a key might be in this run (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => {
                compare_bytes(key, min).is_ge() && compare_bytes(key, max).is_le()
            }
            _ => false, // Empty run
        }
    }

    /// Seekable cursor over the run
    pub fn iter(&self) -> RunIter {
        RunIter::new(Arc::clone(&self.records))
    }
}
