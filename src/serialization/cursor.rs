//! Bounds-checked reader over an immutable byte sequence
//!
//! Offers two styles over the same buffer: positional reads (`slice`,
//! `read_varint`, `read_le_uint`) that mirror how script code addresses a
//! byte string, and a sequential `take_*` API that advances an internal
//! position. Neither ever reads past the end of the buffer; every overrun is
//! reported as `MalformedInput`.

use crate::error::{CovenantError, Result};
use crate::types::ByteString;

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

fn out_of_range(what: &'static str, pos: usize, need: usize, len: usize) -> CovenantError {
    CovenantError::malformed(format!(
        "{what}: need {need} bytes at offset {pos}, buffer is {len} bytes"
    ))
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    /// Total buffer length
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current sequential read position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current position
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    // ------------------------------------------------------------------
    // Positional reads
    // ------------------------------------------------------------------

    /// Borrow `[start, end)`; `end = None` means to the end of the buffer
    pub fn slice_ref(&self, start: usize, end: Option<usize>) -> Result<&'a [u8]> {
        let end = end.unwrap_or(self.data.len());
        if start > end || end > self.data.len() {
            return Err(CovenantError::malformed(format!(
                "slice [{start}, {end}) outside buffer of {} bytes",
                self.data.len()
            )));
        }
        Ok(&self.data[start..end])
    }

    /// Copy `[start, end)` into a fresh ByteString
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<ByteString> {
        self.slice_ref(start, end).map(ByteString::from)
    }

    /// Decode an unsigned little-endian integer of exactly `len` bytes at `pos`
    pub fn read_le_uint(&self, pos: usize, len: usize) -> Result<u64> {
        if len > 8 {
            return Err(CovenantError::malformed(format!(
                "little-endian integer of {len} bytes exceeds 64 bits"
            )));
        }
        let end = pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| out_of_range("read_le_uint", pos, len, self.data.len()))?;
        let mut buf = [0u8; 8];
        buf[..len].copy_from_slice(&self.data[pos..end]);
        Ok(u64::from_le_bytes(buf))
    }

    /// Decode a compact-size varint at `pos`
    ///
    /// Returns `(value, width)` where width is 1, 3, 5 or 9. Any width is
    /// accepted for any value.
    pub fn read_varint(&self, pos: usize) -> Result<(u64, usize)> {
        let first = *self
            .data
            .get(pos)
            .ok_or_else(|| out_of_range("read_varint", pos, 1, self.data.len()))?;
        match first {
            0xfd => Ok((self.read_le_uint(pos + 1, 2)?, 3)),
            0xfe => Ok((self.read_le_uint(pos + 1, 4)?, 5)),
            0xff => Ok((self.read_le_uint(pos + 1, 8)?, 9)),
            b => Ok((b as u64, 1)),
        }
    }

    // ------------------------------------------------------------------
    // Sequential reads
    // ------------------------------------------------------------------

    /// Advance past `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(out_of_range("take", self.pos, n, self.data.len()));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read a fixed-size array and advance
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read an unsigned little-endian integer of `len` bytes and advance
    pub fn take_le_uint(&mut self, len: usize) -> Result<u64> {
        let value = self.read_le_uint(self.pos, len)?;
        self.pos += len;
        Ok(value)
    }

    /// Read a compact-size varint and advance
    pub fn take_varint(&mut self) -> Result<u64> {
        let (value, width) = self.read_varint(self.pos)?;
        self.pos += width;
        Ok(value)
    }

    /// Read a varint length followed by that many bytes
    pub fn take_var_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.take_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| CovenantError::malformed(format!("length {len} exceeds address space")))?;
        self.take(len)
    }
}
