//! Binary reader for bounds-checked parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor over a borrowed byte slice.
//! Every read and every seek is checked against the slice length, so a
//! malformed length or offset surfaces as an [`Error`] instead of a panic.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A little-endian reader over a byte slice.
///
/// The reader owns nothing but its position; cloning it is cheap and gives an
/// independent cursor over the same data.
///
/// # Example
///
/// ```
/// use chkn_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x02, 0x00, b'h', b'i'];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u16_prefixed().unwrap(), b"hi");
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Seek to an absolute position.
    ///
    /// Seeking to exactly the end of the buffer is allowed; any read that
    /// follows will fail.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        match usize::try_from(target) {
            Ok(position) if position <= self.data.len() => {
                self.position = position;
                Ok(())
            }
            _ => Err(Error::SeekOutOfBounds {
                target,
                len: self.data.len(),
            }),
        }
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                offset: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a block whose length is given by a preceding u16.
    pub fn read_u16_prefixed(&mut self) -> Result<&'a [u8]> {
        let length = self.read_u16()?;
        self.read_bytes(length as usize)
    }

    /// Read a block whose length is given by a preceding u32.
    pub fn read_u32_prefixed(&mut self) -> Result<&'a [u8]> {
        let length = self.read_u32()?;
        self.read_bytes(length as usize)
    }

    /// Read a block whose length is given by a preceding i32.
    ///
    /// A negative prefix is rejected rather than reinterpreted.
    pub fn read_i32_prefixed(&mut self) -> Result<&'a [u8]> {
        let length = self.read_i32()?;
        if length < 0 {
            return Err(Error::NegativeLength(length as i64));
        }
        self.read_bytes(length as usize)
    }

    /// Read a struct using zerocopy.
    ///
    /// The struct must implement `FromBytes`; use the endian-aware field
    /// types from `zerocopy::little_endian` so the layout is portable.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let offset = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            offset,
            needed: size,
            available: bytes.len(),
        })
    }
}
