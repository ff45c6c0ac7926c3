//! Bitcoin compact-size (VarInt) encoding/decoding
//!
//! Encoding rules:
//! - If value < 0xfd: single byte
//! - If value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - If value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - Otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! `decode_varint` is strict and rejects non-minimal encodings, as full
//! transaction deserialization does. The on-chain style field readers in
//! [`crate::serialization::cursor`] accept any width.

use crate::error::{CovenantError, Result};
use thiserror::Error;

/// Error type for VarInt decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VarIntError {
    #[error("Insufficient bytes to decode VarInt")]
    InsufficientBytes,
    #[error("Non-minimal VarInt encoding")]
    NonMinimal,
}

impl From<VarIntError> for CovenantError {
    fn from(e: VarIntError) -> Self {
        CovenantError::malformed(e.to_string())
    }
}

/// Number of bytes `encode_varint(value)` produces
#[inline]
pub fn varint_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Encode a u64 value as a Bitcoin VarInt
///
/// # Examples
///
/// ```
/// use covenant_proof::serialization::varint::encode_varint;
///
/// assert_eq!(encode_varint(252), vec![252]);
/// assert_eq!(encode_varint(253), vec![0xfd, 253, 0]);
/// assert_eq!(encode_varint(65536), vec![0xfe, 0, 0, 1, 0]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut result = Vec::with_capacity(varint_len(value));
    match varint_len(value) {
        1 => result.push(value as u8),
        3 => {
            result.push(0xfd);
            result.extend_from_slice(&(value as u16).to_le_bytes());
        }
        5 => {
            result.push(0xfe);
            result.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            result.push(0xff);
            result.extend_from_slice(&value.to_le_bytes());
        }
    }
    debug_assert_eq!(result.len(), varint_len(value));
    result
}

/// Decode a canonical Bitcoin VarInt from the start of `data`
///
/// Returns the decoded value and the number of bytes consumed.
///
/// ```
/// use covenant_proof::serialization::varint::decode_varint;
///
/// assert_eq!(decode_varint(&[0xfd, 0xfd, 0x00]).unwrap(), (0xfd, 3));
/// assert!(decode_varint(&[0xfd, 0x10, 0x00]).is_err()); // non-minimal
/// ```
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let first = *data.first().ok_or(VarIntError::InsufficientBytes)?;
    let width = match first {
        0xfd => 2,
        0xfe => 4,
        0xff => 8,
        b => return Ok((b as u64, 1)),
    };
    if data.len() < 1 + width {
        return Err(VarIntError::InsufficientBytes.into());
    }
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(&data[1..1 + width]);
    let value = u64::from_le_bytes(buf);

    // Bitcoin Core rejects values that fit a shorter encoding
    if varint_len(value) != 1 + width {
        return Err(VarIntError::NonMinimal.into());
    }
    Ok((value, 1 + width))
}
