use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PdsError {
    #[error("Invalid magic number in header: found {found:#010x}, expected {expected:#010x}")]
    InvalidMagic { found: u32, expected: u32 },

    #[error("Header too small: declared {found} bytes, minimum is {minimum}")]
    HeaderTooSmall { found: u32, minimum: u32 },

    #[error("Header checksum verification failed: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("Unsupported format version: {found} (minimum {minimum})")]
    UnsupportedVersion { found: u32, minimum: u32 },

    #[error("Out of bounds: {len} bytes at offset {offset} exceed buffer of {buffer_len} bytes")]
    OutOfBounds {
        offset: u64,
        len: u64,
        buffer_len: usize,
    },

    #[error("Descriptor at offset {offset} too small: declared {found} bytes, minimum is {minimum}")]
    DescriptorTooSmall { offset: u32, found: u32, minimum: u32 },

    #[error("Malformed descriptor chain at offset {offset}: {source}")]
    MalformedChain {
        offset: u32,
        #[source]
        source: Box<PdsError>,
    },

    #[error("Non-monotonic descriptor chain: record at {offset} links to {next}")]
    NonMonotonicChain { offset: u32, next: u32 },

    #[error("Descriptor chain too long: more than {max} records")]
    ChainTooLong { max: usize },

    #[error("Too many descriptors: {count} supplied, maximum is {max}")]
    TooManyDescriptors { count: usize, max: usize },

    #[error("Version string too long: {len} bytes, maximum is {max}")]
    VersionStringTooLong { len: usize, max: usize },

    #[error("Invalid version string: must not contain NUL bytes")]
    InvalidVersionString,

    #[error("Invalid shared payload: entry {index} refers to entry {target}, which does not precede it")]
    InvalidSharedPayload { index: usize, target: usize },

    #[error("Store too large: {size} bytes exceeds the 32-bit offset space")]
    StoreTooLarge { size: usize },

    #[error("Invalid placement: entry {index} at offset {offset} is unaligned or not past the previous entry")]
    InvalidPlacement { index: usize, offset: u32 },

    #[error("Region of {len} bytes at offset {offset} overlaps the header, a descriptor or another region")]
    OverlappingRegion { offset: u32, len: usize },
}

/// Error classification without diagnostic payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidMagic,
    HeaderTooSmall,
    ChecksumMismatch,
    UnsupportedVersion,
    OutOfBounds,
    DescriptorTooSmall,
    MalformedChain,
    NonMonotonicChain,
    ChainTooLong,
    TooManyDescriptors,
    VersionStringTooLong,
    InvalidVersionString,
    InvalidSharedPayload,
    StoreTooLarge,
    InvalidPlacement,
    OverlappingRegion,
}

impl PdsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdsError::InvalidMagic { .. } => ErrorKind::InvalidMagic,
            PdsError::HeaderTooSmall { .. } => ErrorKind::HeaderTooSmall,
            PdsError::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            PdsError::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            PdsError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            PdsError::DescriptorTooSmall { .. } => ErrorKind::DescriptorTooSmall,
            PdsError::MalformedChain { .. } => ErrorKind::MalformedChain,
            PdsError::NonMonotonicChain { .. } => ErrorKind::NonMonotonicChain,
            PdsError::ChainTooLong { .. } => ErrorKind::ChainTooLong,
            PdsError::TooManyDescriptors { .. } => ErrorKind::TooManyDescriptors,
            PdsError::VersionStringTooLong { .. } => ErrorKind::VersionStringTooLong,
            PdsError::InvalidVersionString => ErrorKind::InvalidVersionString,
            PdsError::InvalidSharedPayload { .. } => ErrorKind::InvalidSharedPayload,
            PdsError::StoreTooLarge { .. } => ErrorKind::StoreTooLarge,
            PdsError::InvalidPlacement { .. } => ErrorKind::InvalidPlacement,
            PdsError::OverlappingRegion { .. } => ErrorKind::OverlappingRegion,
        }
    }

    /// The innermost error, looking through `MalformedChain` wrappers.
    pub fn root_cause(&self) -> &PdsError {
        let mut err = self;
        while let PdsError::MalformedChain { source, .. } = err {
            err = source;
        }
        err
    }

    /// Offset of the chain record involved, if the error concerns one.
    pub fn record_offset(&self) -> Option<u32> {
        match self {
            PdsError::MalformedChain { offset, .. }
            | PdsError::NonMonotonicChain { offset, .. }
            | PdsError::DescriptorTooSmall { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PdsError>;

/// Errors from loading a build manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid descriptor #{index}: {reason}")]
    InvalidDescriptor { index: usize, reason: String },

    #[error("Store error: {0}")]
    Pds(#[from] PdsError),
}
