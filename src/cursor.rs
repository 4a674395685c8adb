//! Bounds-checked reader over a decoded blob.
//!
//! Every field of the serialized context format is read through a
//! [`ByteCursor`]. Each read verifies the remaining length before advancing,
//! so a truncated or lying length prefix surfaces as
//! [`DecodeError::Truncated`] instead of a read past the end of the blob.

use crate::error::{DecodeError, Result};

/// Forward-only cursor over a borrowed byte slice.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Verify that `need` bytes are available.
    fn check(&self, need: usize) -> Result<()> {
        if self.remaining() < need {
            return Err(DecodeError::Truncated {
                need,
                have: self.remaining(),
            });
        }
        Ok(())
    }

    /// Consume `n` bytes and return them as a sub-slice of the blob.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.check(1)?;
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a 3-byte big-endian length prefix (certificates, tickets,
    /// context config flags all use 24-bit fields).
    pub fn read_u24_be(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | (b[2] as u32))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64_be(&mut self) -> Result<u64> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}
