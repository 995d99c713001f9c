//! Bounds-checked little-endian field extraction
//!
//! Every read validates `offset + len <= buffer_len` with overflow-checked
//! arithmetic before touching the buffer. Multi-byte fields are copied into
//! local arrays and decoded with `from_le_bytes`, so the source buffer needs
//! no particular alignment.

use crate::error::{PdsError, Result};
use std::ops::Range;

/// Read-only view over a store buffer.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Validate a byte range without reading it.
    pub fn range(&self, offset: usize, len: usize) -> Result<Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= self.buf.len() => Ok(offset..end),
            _ => Err(PdsError::OutOfBounds {
                offset: offset as u64,
                len: len as u64,
                buffer_len: self.buf.len(),
            }),
        }
    }

    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let range = self.range(offset, len)?;
        Ok(&self.buf[range])
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let bytes = self.read_bytes(offset, N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array(offset)?))
    }

    /// Reader over `[offset, offset + len)`; offsets in the result are
    /// relative to `offset`.
    pub fn window(&self, offset: usize, len: usize) -> Result<ByteReader<'a>> {
        Ok(ByteReader::new(self.read_bytes(offset, len)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_little_endian() {
        let buf = [0x31, 0x53, 0x44, 0x50, 0xAA];
        let reader = ByteReader::new(&buf);
        assert_eq!(reader.read_u32_le(0).unwrap(), 0x5044_5331);
        assert_eq!(reader.read_bytes(4, 1).unwrap(), &[0xAA]);
    }

    #[test]
    fn test_unaligned_reads() {
        let mut buf = vec![0u8; 11];
        buf[3..7].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        let reader = ByteReader::new(&buf[1..]);
        assert_eq!(reader.read_u32_le(2).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_past_end_fails() {
        let buf = [0u8; 8];
        let reader = ByteReader::new(&buf);

        assert!(reader.read_u32_le(4).is_ok());
        assert_eq!(
            reader.read_u32_le(5),
            Err(PdsError::OutOfBounds {
                offset: 5,
                len: 4,
                buffer_len: 8,
            })
        );
        assert!(reader.read_bytes(8, 0).is_ok());
        assert!(reader.read_bytes(9, 0).is_err());
    }

    #[test]
    fn test_offset_overflow_is_out_of_bounds() {
        let buf = [0u8; 8];
        let reader = ByteReader::new(&buf);
        assert!(matches!(
            reader.read_bytes(usize::MAX, 2),
            Err(PdsError::OutOfBounds { .. })
        ));
        assert!(matches!(
            reader.read_u32_le(usize::MAX - 1),
            Err(PdsError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_window_is_relative() {
        let buf = [0u8, 0, 9, 8, 7, 6];
        let reader = ByteReader::new(&buf);
        let window = reader.window(2, 3).unwrap();
        assert_eq!(window.read_array::<3>(0).unwrap(), [9, 8, 7]);
        assert!(window.read_bytes(3, 1).is_err());
        assert!(reader.window(4, 3).is_err());
    }
}
