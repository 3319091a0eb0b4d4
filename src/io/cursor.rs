use crate::io::Error;
use byteorder::{BigEndian, ByteOrder};

/// Bounds-checked sequential reader over a borrowed byte buffer.
///
/// The position never exceeds the buffer length; any read that would cross the end fails
/// with [`ErrorKind::BufferUnderrun`](crate::io::ErrorKind::BufferUnderrun) and leaves the
/// position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> From<&'a [u8]> for ByteCursor<'a> {
    #[inline]
    fn from(buffer: &'a [u8]) -> Self {
        Self::new(buffer)
    }
}

impl<'a> ByteCursor<'a> {
    #[inline]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    /// Looks `offset` bytes ahead of the current position without consuming anything.
    pub fn peek(&self, offset: usize) -> Result<u8, Error> {
        let len = offset
            .checked_add(1)
            .ok_or_else(|| Error::buffer_underrun(self.position, usize::MAX, self.remaining()))?;
        self.ensure(len)?;
        Ok(self.buffer[self.position + offset])
    }

    pub fn peek_bytes(&self, len: usize) -> Result<&'a [u8], Error> {
        self.ensure(len)?;
        Ok(&self.buffer[self.position..self.position + len])
    }

    #[inline]
    pub fn read_byte(&mut self) -> Result<u8, Error> {
        let byte = self.peek(0)?;
        self.position += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let bytes = self.peek_bytes(len)?;
        self.position += len;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    #[inline]
    pub fn read_u16_be(&mut self) -> Result<u16, Error> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    #[inline]
    pub fn read_u24_be(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u24(self.read_bytes(3)?))
    }

    /// Steps back over bytes that were already consumed. Saturates at the buffer start.
    pub fn rewind(&mut self, len: usize) {
        self.position = self.position.saturating_sub(len);
    }

    #[inline]
    fn ensure(&self, len: usize) -> Result<(), Error> {
        if len > self.remaining() {
            Err(Error::buffer_underrun(self.position, len, self.remaining()))
        } else {
            Ok(())
        }
    }
}
