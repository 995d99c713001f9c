use crate::accessor::ByteReader;
use crate::checksum::checksum;
use crate::error::{PdsError, Result};
use serde::{Deserialize, Serialize};

/// Magic number: "PDS1" read as a little-endian u32.
pub const PDS_MAGIC: u32 = 0x5044_5331;

/// Format version emitted by this implementation, and the minimum accepted.
pub const PDS_HEADER_VERSION: u32 = 1;

/// Size of the header layout this implementation understands.
pub const HEADER_SIZE: usize = 148;

/// Smallest declared header size accepted: magic, size, checksum and version.
pub const MIN_HEADER_SIZE: usize = 16;

/// First byte covered by the header checksum (after magic, size, checksum).
pub const CHECKSUM_START: usize = 12;

/// Bytes reserved for the NUL-terminated version string.
pub const VERSION_STRING_CAPACITY: usize = 128;

/// Longest version string the encoder accepts; one byte is kept for the NUL.
pub const MAX_VERSION_STRING_LEN: usize = VERSION_STRING_CAPACITY - 1;

const OFFSET_MAGIC: usize = 0;
const OFFSET_HEADER_SIZE: usize = 4;
const OFFSET_HEADER_CRC: usize = 8;
const OFFSET_VERSION: usize = 12;
const OFFSET_FIRST_DESCRIPTOR: usize = 16;
const OFFSET_VERSION_STRING: usize = 20;

/// PDS store header
///
/// The header sits at byte 0 of the store and names the first descriptor of
/// the chain. Decoding tolerates headers larger than [`HEADER_SIZE`] (the
/// extra bytes are ignored) and smaller ones down to [`MIN_HEADER_SIZE`]
/// (missing trailing fields take their defaults: offset 0, empty string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Magic number, always [`PDS_MAGIC`] once decoded
    pub magic: u32,

    /// Declared header size in bytes
    pub header_size: u32,

    /// Checksum over `[CHECKSUM_START, header_size)`
    pub header_crc: u32,

    /// Header format version
    pub version: u32,

    /// Offset of the first descriptor, or 0 for an empty store
    pub first_descriptor_offset: u32,

    /// Version string without its NUL terminator
    ///
    /// Decoded lossily: invalid UTF-8 sequences become U+FFFD.
    pub version_string: String,
}

impl Header {
    /// Create a header for an empty store
    pub fn new() -> Self {
        Header {
            magic: PDS_MAGIC,
            header_size: HEADER_SIZE as u32,
            header_crc: 0,
            version: PDS_HEADER_VERSION,
            first_descriptor_offset: 0,
            version_string: String::new(),
        }
    }

    pub fn with_version_string(mut self, version_string: impl Into<String>) -> Self {
        self.version_string = version_string.into();
        self
    }

    /// Offset of the first descriptor, or `None` if the store is empty
    pub fn first_descriptor(&self) -> Option<u32> {
        match self.first_descriptor_offset {
            0 => None,
            offset => Some(offset),
        }
    }

    /// Validate the fields the encoder will write
    pub fn validate(&self) -> Result<()> {
        if self.magic != PDS_MAGIC {
            return Err(PdsError::InvalidMagic {
                found: self.magic,
                expected: PDS_MAGIC,
            });
        }

        if self.version < PDS_HEADER_VERSION {
            return Err(PdsError::UnsupportedVersion {
                found: self.version,
                minimum: PDS_HEADER_VERSION,
            });
        }

        validate_version_string(&self.version_string)
    }

    /// Serialize header to bytes
    ///
    /// Always emits the current [`HEADER_SIZE`] layout with a freshly
    /// computed checksum; the `header_size` and `header_crc` fields of `self`
    /// are not consulted.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(&PDS_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&(HEADER_SIZE as u32).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.first_descriptor_offset.to_le_bytes());
        bytes.extend_from_slice(self.version_string.as_bytes());

        // NUL terminator and padding
        bytes.resize(HEADER_SIZE, 0);

        let crc = checksum(&bytes[CHECKSUM_START..]);
        bytes[OFFSET_HEADER_CRC..OFFSET_HEADER_CRC + 4].copy_from_slice(&crc.to_le_bytes());

        Ok(bytes)
    }

    /// Deserialize and validate a header at the start of `bytes`
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(&ByteReader::new(bytes))
    }

    /// Decode and validate the header at offset 0 of `reader`
    ///
    /// Checks run in order: magic, declared size, checksum, version. Nothing
    /// past the magic is read when the magic does not match.
    pub fn decode(reader: &ByteReader<'_>) -> Result<Self> {
        let magic = reader.read_u32_le(OFFSET_MAGIC)?;
        if magic != PDS_MAGIC {
            return Err(PdsError::InvalidMagic {
                found: magic,
                expected: PDS_MAGIC,
            });
        }

        let header_size = reader.read_u32_le(OFFSET_HEADER_SIZE)?;
        if (header_size as usize) < MIN_HEADER_SIZE {
            return Err(PdsError::HeaderTooSmall {
                found: header_size,
                minimum: MIN_HEADER_SIZE as u32,
            });
        }

        let header_crc = reader.read_u32_le(OFFSET_HEADER_CRC)?;
        let protected = reader.read_bytes(CHECKSUM_START, header_size as usize - CHECKSUM_START)?;
        let computed = checksum(protected);
        if computed != header_crc {
            return Err(PdsError::ChecksumMismatch {
                stored: header_crc,
                computed,
            });
        }

        let version = reader.read_u32_le(OFFSET_VERSION)?;
        if version < PDS_HEADER_VERSION {
            return Err(PdsError::UnsupportedVersion {
                found: version,
                minimum: PDS_HEADER_VERSION,
            });
        }

        // Only the fields covered by both the declared and the known layout
        let known = (header_size as usize).min(HEADER_SIZE);

        let first_descriptor_offset = if known >= OFFSET_FIRST_DESCRIPTOR + 4 {
            reader.read_u32_le(OFFSET_FIRST_DESCRIPTOR)?
        } else {
            0
        };

        let version_string = if known > OFFSET_VERSION_STRING {
            let raw = reader.read_bytes(OFFSET_VERSION_STRING, known - OFFSET_VERSION_STRING)?;
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            String::from_utf8_lossy(&raw[..end]).into_owned()
        } else {
            String::new()
        };

        Ok(Header {
            magic,
            header_size,
            header_crc,
            version,
            first_descriptor_offset,
            version_string,
        })
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `s` fits the version string field and survives a round trip.
pub fn validate_version_string(s: &str) -> Result<()> {
    if s.len() > MAX_VERSION_STRING_LEN {
        return Err(PdsError::VersionStringTooLong {
            len: s.len(),
            max: MAX_VERSION_STRING_LEN,
        });
    }

    if s.as_bytes().contains(&0) {
        return Err(PdsError::InvalidVersionString);
    }

    Ok(())
}
