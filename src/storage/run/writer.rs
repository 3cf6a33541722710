//! Run Writer
//!
//! Writes ascending KeyValues to a new run file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::encoding::{encode_u32, encode_u64, render};
use crate::error::Result;
use crate::record::KeyValue;
use crate::TideError;

use super::{RunMeta, HEADER_SIZE, MAGIC, VERSION};

/// Builder for a run file
pub struct RunWriter {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of records written
    entry_count: u64,
    /// Current write position
    current_offset: u64,
    /// Last record written, to enforce ascending order
    last: Option<KeyValue>,
    min_key: Option<Bytes>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl RunWriter {
    /// Create a new run file, truncating any previous file at `path`
    ///
    /// Writes the header immediately; call `add()` in ascending order, then
    /// `finish()` to write the footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_be_bytes())?;
        writer.write_all(&encode_u64(0))?; // Placeholder for entry count

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            last: None,
            min_key: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Append a record; it must sort strictly after the previous one
    pub fn add(&mut self, record: &KeyValue) -> Result<()> {
        if let Some(last) = &self.last {
            if record <= last {
                return Err(TideError::Storage(format!(
                    "Run records out of order: {} after {}",
                    render(record.key()),
                    render(last.key())
                )));
            }
        }

        let encoded = record.to_bytes();
        self.writer.write_all(&encoded)?;
        self.data_hasher.update(&encoded);

        if self.min_key.is_none() {
            self.min_key = Some(record.key().clone());
        }
        self.current_offset += encoded.len() as u64;
        self.entry_count += 1;
        self.last = Some(record.clone());

        Ok(())
    }

    /// Number of records added so far
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    /// Finish building: write footer, sync, and return metadata
    pub fn finish(mut self) -> Result<RunMeta> {
        let data_end = self.current_offset;
        let data_crc = self.data_hasher.finalize();

        // Footer: data_end (8) + data_crc (4) + padding (4)
        self.writer.write_all(&encode_u64(data_end))?;
        self.writer.write_all(&encode_u32(data_crc))?;
        self.writer.write_all(&[0u8; 4])?;

        self.writer.flush()?;

        // Seek back and update entry count in header
        let mut file = self.writer.into_inner().map_err(|e| {
            TideError::Storage(format!("Failed to flush run file: {}", e))
        })?;
        file.seek(SeekFrom::Start(6))?; // After magic + version
        file.write_all(&encode_u64(self.entry_count))?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        Ok(RunMeta {
            path: self.path,
            entry_count: self.entry_count,
            min_key: self.min_key.unwrap_or_default(),
            max_key: self.last.map(|kv| kv.key().clone()).unwrap_or_default(),
            file_size,
        })
    }
}
