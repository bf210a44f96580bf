use bytes::Buf;

use crate::error::{FrameError, Result};

/// Bounds-checked forward-only reader over one hub transfer.
///
/// The position only increases and never passes the end of the buffer. Every
/// read that would cross the end fails with [`FrameError::Truncated`] against
/// the offset of the instruction tag currently being consumed.
#[derive(Debug, Clone)]
pub struct FrameCursor<'a> {
    buf: &'a [u8],
    pos: usize,
    tag_offset: usize,
}

impl<'a> FrameCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            tag_offset: 0,
        }
    }

    /// Read the next instruction tag, or `None` at the end of the transfer.
    pub fn next_tag(&mut self) -> Option<u8> {
        let tag = *self.buf.get(self.pos)?;
        self.tag_offset = self.pos;
        self.pos += 1;
        Some(tag)
    }

    /// Offset of the most recently read instruction tag.
    pub fn tag_offset(&self) -> usize {
        self.tag_offset
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Bytes from the current position to the end of the transfer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Fail unless at least `needed` bytes remain.
    pub fn require(&self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(FrameError::Truncated {
                offset: self.tag_offset,
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn advance(&mut self, n: usize) -> Result<()> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes and step over them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.require(1)?;
        let mut rest = self.rest();
        let value = rest.get_u8();
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.require(2)?;
        let mut rest = self.rest();
        let value = rest.get_u16_le();
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.require(4)?;
        let mut rest = self.rest();
        let value = rest.get_u32_le();
        self.pos += 4;
        Ok(value)
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        self.require(4)?;
        let mut rest = self.rest();
        let value = rest.get_i32_le();
        self.pos += 4;
        Ok(value)
    }
}
