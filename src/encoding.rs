//! Byte Ordering & Encoding Primitives
//!
//! Everything that orders or sizes records goes through these helpers.
//!
//! ## Responsibilities
//! - Fixed-width big-endian integer encode/decode (u32, u64)
//! - Bounds-checked slicing
//! - Canonical unsigned-byte lexicographic comparison
//! - A cheap polynomial hash for non-cryptographic indexing
//! - Human-readable rendering of arbitrary bytes

use std::cmp::Ordering;

use crate::error::{Result, TideError};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

// =============================================================================
// Fixed-width Integers
// =============================================================================

/// Encode a u32 as 4 big-endian bytes
pub fn encode_u32(x: u32) -> [u8; 4] {
    x.to_be_bytes()
}

/// Encode a u64 as 8 big-endian bytes
pub fn encode_u64(x: u64) -> [u8; 8] {
    x.to_be_bytes()
}

/// Decode the first 4 bytes of `buf` as a big-endian u32
pub fn decode_u32(buf: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = buf
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            TideError::Validation(format!("need 4 bytes to decode u32, got {}", buf.len()))
        })?;
    Ok(u32::from_be_bytes(bytes))
}

/// Decode the first 8 bytes of `buf` as a big-endian u64
pub fn decode_u64(buf: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = buf
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            TideError::Validation(format!("need 8 bytes to decode u64, got {}", buf.len()))
        })?;
    Ok(u64::from_be_bytes(bytes))
}

// =============================================================================
// Slicing
// =============================================================================

/// Extract `len` bytes starting at `start`.
///
/// Offsets are signed so that callers computing positions from untrusted
/// lengths get a `Validation` error instead of a wrap-around.
pub fn slice(buf: &[u8], start: i64, len: i64) -> Result<&[u8]> {
    if start < 0 || len < 0 {
        return Err(TideError::Validation(format!(
            "Invalid offset: {} or len: {}",
            start, len
        )));
    }
    let end = start.checked_add(len).unwrap_or(i64::MAX);
    if end > buf.len() as i64 {
        return Err(TideError::Validation(format!(
            "Buffer overflow, offset: {}, len: {}, buf.length: {}",
            start,
            len,
            buf.len()
        )));
    }
    Ok(&buf[start as usize..end as usize])
}

/// Concatenate two byte strings into a new buffer
pub fn concat(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

// =============================================================================
// Ordering
// =============================================================================

/// Total order over optional byte strings.
///
/// `None` sorts before any present value; present values compare byte-wise
/// as unsigned, and a shorter buffer sorts first when it is a prefix of the
/// longer one.
pub fn compare(a: Option<&[u8]>, b: Option<&[u8]>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_bytes(a, b),
    }
}

/// Unsigned lexicographic comparison of two byte strings
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

// =============================================================================
// Hashing & Rendering
// =============================================================================

/// Polynomial hash: seed 1, `h = h * 31 + byte`, wrapping.
///
/// Not suitable for anything adversarial.
pub fn hash(key: &[u8]) -> u32 {
    key.iter()
        .fold(1u32, |h, &b| h.wrapping_mul(31).wrapping_add(b as u32))
}

/// Render bytes for logs: printable ASCII passes through, everything else
/// (including space) becomes `\xHH`.
pub fn render(buf: &[u8]) -> String {
    let mut out = String::with_capacity(buf.len());
    for &b in buf {
        if (0x21..=0x7E).contains(&b) {
            out.push(b as char);
        } else {
            out.push_str("\\x");
            out.push(HEX_DIGITS[(b >> 4) as usize] as char);
            out.push(HEX_DIGITS[(b & 0x0F) as usize] as char);
        }
    }
    out
}

/// Render a byte count with a binary unit suffix, for log lines
pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}
