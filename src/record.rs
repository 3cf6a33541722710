//! Records
//!
//! The memtable only needs two things from what it stores: a total order and
//! a serialized size. [`Record`] captures that contract; [`KeyValue`] is the
//! concrete versioned record used by the engine and the run files.
//!
//! ## KeyValue encoding
//! ```text
//! ┌──────────────┬──────────────┬─────┬────────┬──────────────┬───────┐
//! │ KeyLen u32BE │ ValLen u32BE │ Key │ Op (1) │ Sequence u64 │ Value │
//! └──────────────┴──────────────┴─────┴────────┴──────────────┴───────┘
//! ```

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

use crate::encoding::{self, compare_bytes};
use crate::error::{Result, TideError};

/// Fixed part of an encoded KeyValue: KeyLen (4) + ValLen (4) + Op (1) + Seq (8)
pub const KV_OVERHEAD: u64 = 17;

/// Contract for anything a memtable can hold
pub trait Record: Ord + Clone + Send + Sync + 'static {
    /// Number of bytes this record occupies once serialized
    fn serialized_size(&self) -> u64;
}

/// Kind of mutation a KeyValue carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    Put,
    Delete,
}

impl Op {
    fn code(self) -> u8 {
        match self {
            Op::Put => 0,
            Op::Delete => 1,
        }
    }

    fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Op::Put),
            1 => Ok(Op::Delete),
            other => Err(TideError::Corruption(format!("unknown op code {}", other))),
        }
    }
}

/// A versioned key-value pair (or tombstone)
///
/// Ordered by key ascending, then sequence descending so the newest version of
/// a key is met first, then op.
///
/// Equality follows the ordering: two KeyValues with the same key, sequence
/// and op are the same record even if their values differ, which is what
/// lets a memtable overwrite in place.
#[derive(Clone)]
pub struct KeyValue {
    key: Bytes,
    value: Bytes,
    op: Op,
    sequence: u64,
}

impl KeyValue {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>, op: Op, sequence: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            op,
            sequence,
        }
    }

    /// A live value
    pub fn put(key: impl Into<Bytes>, value: impl Into<Bytes>, sequence: u64) -> Self {
        Self::new(key, value, Op::Put, sequence)
    }

    /// A tombstone
    pub fn delete(key: impl Into<Bytes>, sequence: u64) -> Self {
        Self::new(key, Bytes::new(), Op::Delete, sequence)
    }

    /// The smallest KeyValue for `key`: seeking to it lands on the newest version
    pub fn seek_key(key: impl Into<Bytes>) -> Self {
        Self::new(key, Bytes::new(), Op::Put, u64::MAX)
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_tombstone(&self) -> bool {
        self.op == Op::Delete
    }

    /// Serialize into the layout described in the module docs
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size() as usize);
        buf.extend_from_slice(&encoding::encode_u32(self.key.len() as u32));
        buf.extend_from_slice(&encoding::encode_u32(self.value.len() as u32));
        buf.extend_from_slice(&self.key);
        buf.push(self.op.code());
        buf.extend_from_slice(&encoding::encode_u64(self.sequence));
        buf.extend_from_slice(&self.value);
        buf
    }

    /// Parse one KeyValue starting at `offset`.
    ///
    /// Returns the record and the number of bytes it consumed.
    pub fn parse_from(buf: &[u8], offset: usize) -> Result<(Self, usize)> {
        let mut pos = offset as i64;

        let key_len = encoding::decode_u32(encoding::slice(buf, pos, 4)?)? as i64;
        pos += 4;
        let val_len = encoding::decode_u32(encoding::slice(buf, pos, 4)?)? as i64;
        pos += 4;

        let key = Bytes::copy_from_slice(encoding::slice(buf, pos, key_len)?);
        pos += key_len;

        let op = Op::from_code(encoding::slice(buf, pos, 1)?[0])?;
        pos += 1;

        let sequence = encoding::decode_u64(encoding::slice(buf, pos, 8)?)?;
        pos += 8;

        let value = Bytes::copy_from_slice(encoding::slice(buf, pos, val_len)?);
        pos += val_len;

        Ok((
            Self {
                key,
                value,
                op,
                sequence,
            },
            pos as usize - offset,
        ))
    }
}

impl Record for KeyValue {
    fn serialized_size(&self) -> u64 {
        KV_OVERHEAD + self.key.len() as u64 + self.value.len() as u64
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_bytes(&self.key, &other.key)
            .then_with(|| other.sequence.cmp(&self.sequence))
            .then_with(|| self.op.cmp(&other.op))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeyValue{{key={}, op={:?}, seq={}, value={}}}",
            encoding::render(&self.key),
            self.op,
            self.sequence,
            encoding::render(&self.value)
        )
    }
}
