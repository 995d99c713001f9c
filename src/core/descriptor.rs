//! Descriptor record codec
//!
//! A descriptor header is a fixed 32-byte record:
//!
//! ```text
//! @0  header_size             u32 LE
//! @4  payload_offset          u32 LE (from store start)
//! @8  payload_size            u32 LE
//! @12 next_descriptor_offset  u32 LE (0 = end of chain)
//! @16 descriptor_type         [u8; 16] RFC 4122 UUID
//! ```
//!
//! Records that declare a larger `header_size` are accepted and the extra
//! bytes ignored. Chain-wide rules (monotonic links, traversal bound) are not
//! checked here; see [`crate::chain`].

use crate::accessor::ByteReader;
use crate::error::{PdsError, Result};
use crate::type_id::TypeId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Size of the descriptor header layout this implementation understands.
pub const DESCRIPTOR_HEADER_SIZE: usize = 32;

/// Smallest declared descriptor header size accepted.
pub const MIN_DESCRIPTOR_HEADER_SIZE: usize = 32;

/// Required alignment of descriptor header offsets within the store.
pub const DESCRIPTOR_ALIGNMENT: usize = 4;

const OFFSET_HEADER_SIZE: usize = 0;
const OFFSET_PAYLOAD_OFFSET: usize = 4;
const OFFSET_PAYLOAD_SIZE: usize = 8;
const OFFSET_NEXT: usize = 12;
const OFFSET_TYPE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
    pub header_size: u32,
    pub payload_offset: u32,
    pub payload_size: u32,
    pub next_descriptor_offset: u32,
    pub descriptor_type: TypeId,
}

impl Descriptor {
    pub fn new(
        descriptor_type: TypeId,
        payload_offset: u32,
        payload_size: u32,
        next_descriptor_offset: u32,
    ) -> Self {
        Descriptor {
            header_size: DESCRIPTOR_HEADER_SIZE as u32,
            payload_offset,
            payload_size,
            next_descriptor_offset,
            descriptor_type,
        }
    }

    /// Offset of the next record, or `None` at the end of the chain
    pub fn next_descriptor(&self) -> Option<u32> {
        match self.next_descriptor_offset {
            0 => None,
            offset => Some(offset),
        }
    }

    /// Payload byte range, validated against `reader`
    pub fn payload_range(&self, reader: &ByteReader<'_>) -> Result<Range<usize>> {
        reader.range(self.payload_offset as usize, self.payload_size as usize)
    }

    /// Resolve the payload slice in the store buffer
    pub fn payload<'a>(&self, reader: &ByteReader<'a>) -> Result<&'a [u8]> {
        reader.read_bytes(self.payload_offset as usize, self.payload_size as usize)
    }

    /// Serialize to the current 32-byte layout
    ///
    /// `header_size` is always written as [`DESCRIPTOR_HEADER_SIZE`].
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_HEADER_SIZE] {
        let mut bytes = [0u8; DESCRIPTOR_HEADER_SIZE];
        bytes[OFFSET_HEADER_SIZE..OFFSET_HEADER_SIZE + 4]
            .copy_from_slice(&(DESCRIPTOR_HEADER_SIZE as u32).to_le_bytes());
        bytes[OFFSET_PAYLOAD_OFFSET..OFFSET_PAYLOAD_OFFSET + 4]
            .copy_from_slice(&self.payload_offset.to_le_bytes());
        bytes[OFFSET_PAYLOAD_SIZE..OFFSET_PAYLOAD_SIZE + 4]
            .copy_from_slice(&self.payload_size.to_le_bytes());
        bytes[OFFSET_NEXT..OFFSET_NEXT + 4]
            .copy_from_slice(&self.next_descriptor_offset.to_le_bytes());
        bytes[OFFSET_TYPE..OFFSET_TYPE + 16].copy_from_slice(self.descriptor_type.as_bytes());
        bytes
    }

    /// Decode the descriptor header at `offset`
    ///
    /// Fails with `OutOfBounds` if the declared record extends past the end
    /// of the buffer, and with `DescriptorTooSmall` if it declares fewer
    /// bytes than the known layout needs. The payload is not resolved.
    pub fn decode(reader: &ByteReader<'_>, offset: u32) -> Result<Self> {
        let base = offset as usize;

        let header_size = reader.read_u32_le(base + OFFSET_HEADER_SIZE)?;
        if (header_size as usize) < MIN_DESCRIPTOR_HEADER_SIZE {
            return Err(PdsError::DescriptorTooSmall {
                offset,
                found: header_size,
                minimum: MIN_DESCRIPTOR_HEADER_SIZE as u32,
            });
        }

        // Whole declared record, including fields newer than ours
        let record = reader.window(base, header_size as usize)?;

        Ok(Descriptor {
            header_size,
            payload_offset: record.read_u32_le(OFFSET_PAYLOAD_OFFSET)?,
            payload_size: record.read_u32_le(OFFSET_PAYLOAD_SIZE)?,
            next_descriptor_offset: record.read_u32_le(OFFSET_NEXT)?,
            descriptor_type: TypeId(record.read_array(OFFSET_TYPE)?),
        })
    }
}

/// Decode the descriptor at `offset` and resolve its payload slice.
pub fn decode_descriptor<'a>(reader: &ByteReader<'a>, offset: u32) -> Result<(Descriptor, &'a [u8])> {
    let descriptor = Descriptor::decode(reader, offset)?;
    let payload = descriptor.payload(reader)?;
    Ok((descriptor, payload))
}

/// Round `offset` up to the next descriptor alignment boundary.
pub fn align_up(offset: usize) -> usize {
    (offset + DESCRIPTOR_ALIGNMENT - 1) & !(DESCRIPTOR_ALIGNMENT - 1)
}
