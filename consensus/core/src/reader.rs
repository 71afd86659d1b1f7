//! Bounds-checked cursor over raw transaction bytes.
//!
//! Every read either consumes exactly the requested bytes or fails with
//! [`TxParseError::OutOfBounds`] leaving the cursor where it was.

use crate::errors::{TxParseError, TxParseResult};

pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, needed: usize) -> TxParseResult<()> {
        if needed > self.remaining() {
            return Err(TxParseError::OutOfBounds { needed, remaining: self.remaining() });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> TxParseResult<&'a [u8]> {
        self.ensure(n)?;
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> TxParseResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Returns the next byte without consuming it
    pub fn peek(&self) -> TxParseResult<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    pub fn skip(&mut self, n: usize) -> TxParseResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Reads an unsigned little-endian integer of `n` bytes, `1 <= n <= 8`
    pub fn read_uint(&mut self, n: usize) -> TxParseResult<u64> {
        if !(1..=8).contains(&n) {
            return Err(TxParseError::InvalidIntegerWidth(n));
        }
        let mut buf = [0u8; 8];
        buf[..n].copy_from_slice(self.read_bytes(n)?);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_u8(&mut self) -> TxParseResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> TxParseResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> TxParseResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> TxParseResult<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    /// Reads a Bitcoin `CompactSize`. Non-minimal encodings are rejected.
    pub fn read_compact_size(&mut self) -> TxParseResult<u64> {
        let start = self.pos;
        let prefix = self.read_u8()?;
        let (value, min) = match prefix {
            0xfd => (self.read_u16_le().map(u64::from), 0xfd),
            0xfe => (self.read_u32_le().map(u64::from), 0x1_0000),
            0xff => (self.read_u64_le(), 0x1_0000_0000),
            n => return Ok(n as u64),
        };
        let value = value.inspect_err(|_| self.pos = start)?;
        if value < min {
            self.pos = start;
            return Err(TxParseError::NonMinimalCompactSize(value));
        }
        Ok(value)
    }

    /// Reads a compact-size length followed by that many bytes
    pub fn read_var_bytes(&mut self) -> TxParseResult<&'a [u8]> {
        let start = self.pos;
        let len = self.read_compact_size()?;
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.read_bytes(len).inspect_err(|_| self.pos = start)
    }
}
