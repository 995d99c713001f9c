//! Store construction
//!
//! By default layout is left to right: the header at offset 0, then for each
//! entry a descriptor header aligned to 4 bytes followed immediately by its
//! inline payload. Entries that share an earlier entry's payload get a
//! descriptor only.
//!
//! Callers may also pin a descriptor to an explicit offset, place raw byte
//! regions anywhere past the header, and point payloads at absolute store
//! offsets. Explicit offsets must still increase from entry to entry, so links
//! always point forward.

use crate::accessor::ByteReader;
use crate::config::BuildOptions;
use crate::descriptor::{align_up, Descriptor, DESCRIPTOR_ALIGNMENT, DESCRIPTOR_HEADER_SIZE};
use crate::document::Document;
use crate::error::{PdsError, Result};
use crate::header::{Header, HEADER_SIZE, MAX_VERSION_STRING_LEN};
use crate::type_id::TypeId;
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

/// Where an entry's payload bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    /// Bytes placed right after this entry's descriptor header
    Inline(Vec<u8>),

    /// Same payload offset and size as the entry at this earlier index
    SharedWith(usize),

    /// Bytes already present at an absolute store offset, usually a region
    /// added with [`PdsBuilder::region`]. Any number of entries may name the
    /// same location.
    At { offset: u32, size: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEntry {
    pub type_id: TypeId,
    pub payload: PayloadSource,

    /// Descriptor header offset; `None` places it after the previous entry
    pub offset: Option<u32>,
}

impl BuildEntry {
    pub fn inline(type_id: TypeId, payload: impl Into<Vec<u8>>) -> Self {
        BuildEntry {
            type_id,
            payload: PayloadSource::Inline(payload.into()),
            offset: None,
        }
    }

    pub fn shared(type_id: TypeId, index: usize) -> Self {
        BuildEntry {
            type_id,
            payload: PayloadSource::SharedWith(index),
            offset: None,
        }
    }

    /// Entry whose payload is `size` bytes at store offset `offset`
    pub fn at(type_id: TypeId, offset: u32, size: u32) -> Self {
        BuildEntry {
            type_id,
            payload: PayloadSource::At { offset, size },
            offset: None,
        }
    }

    /// Pin the descriptor header to `offset` (a multiple of 4, past the
    /// previous entry)
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Raw bytes written at a fixed store offset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    offset: u32,
    bytes: Vec<u8>,
}

impl Region {
    fn span(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.bytes.len()
    }
}

/// Builder for PDS stores
///
/// # Examples
///
/// ```
/// use pds::{Document, PdsBuilder, TypeId};
///
/// # fn main() -> pds::Result<()> {
/// let bytes = PdsBuilder::new()
///     .version_string("v1.0")
///     .descriptor(TypeId([0; 16]), b"A".to_vec())
///     .shared_descriptor(TypeId([1; 16]), 0)
///     .build()?;
///
/// let doc = Document::parse(&bytes)?;
/// assert_eq!(doc.len(), 2);
/// assert_eq!(doc.as_slice()[1].payload, b"A");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PdsBuilder {
    version_string: String,
    options: BuildOptions,
    entries: Vec<BuildEntry>,
    regions: Vec<Region>,
}

impl PdsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the entries of a parsed document
    ///
    /// Entries whose payload location repeats an earlier entry's become
    /// shared entries, so sharing survives the round trip. A version string
    /// the encoder cannot hold (an unterminated 128-byte field, or one grown
    /// by lossy decoding) is cut to the longest prefix that fits.
    pub fn from_document(doc: &Document<'_>) -> Self {
        let mut builder = PdsBuilder::new()
            .version_string(encodable_prefix(&doc.header().version_string))
            .format_version(doc.header().version);

        let mut seen: HashMap<(u32, u32), usize> = HashMap::new();
        for (index, entry) in doc.entries().enumerate() {
            let key = (entry.descriptor.payload_offset, entry.descriptor.payload_size);
            match seen.get(&key) {
                Some(&target) => builder = builder.shared_descriptor(entry.type_id(), target),
                None => {
                    seen.insert(key, index);
                    builder = builder.descriptor(entry.type_id(), entry.payload.to_vec());
                }
            }
        }

        builder
    }

    /// Set the header version string (at most 127 bytes, no NUL)
    pub fn version_string<S: Into<String>>(mut self, version_string: S) -> Self {
        self.version_string = version_string.into();
        self
    }

    pub fn max_descriptors(mut self, max_descriptors: usize) -> Self {
        self.options.max_descriptors = max_descriptors;
        self
    }

    pub fn format_version(mut self, format_version: u32) -> Self {
        self.options.format_version = format_version;
        self
    }

    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Append a descriptor with its own payload
    pub fn descriptor(mut self, type_id: TypeId, payload: impl Into<Vec<u8>>) -> Self {
        self.entries.push(BuildEntry::inline(type_id, payload));
        self
    }

    /// Append a descriptor reusing the payload of entry `index`
    pub fn shared_descriptor(mut self, type_id: TypeId, index: usize) -> Self {
        self.entries.push(BuildEntry::shared(type_id, index));
        self
    }

    pub fn entry(mut self, entry: BuildEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Write `bytes` at store offset `offset`
    ///
    /// Regions may not overlap the header, any descriptor or inline payload,
    /// or each other. Entries reach them through [`PayloadSource::At`].
    pub fn region(mut self, offset: u32, bytes: impl Into<Vec<u8>>) -> Self {
        self.regions.push(Region {
            offset,
            bytes: bytes.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        assemble(&self.version_string, &self.entries, &self.regions, &self.options)
    }
}

/// Longest prefix of `s` within the encoder's limit, cut on a char boundary.
fn encodable_prefix(s: &str) -> &str {
    let mut end = s.len().min(MAX_VERSION_STRING_LEN);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build a store with default [`BuildOptions`].
pub fn build(version_string: &str, entries: &[BuildEntry]) -> Result<Vec<u8>> {
    build_with(version_string, entries, &BuildOptions::default())
}

pub fn build_with(
    version_string: &str,
    entries: &[BuildEntry],
    options: &BuildOptions,
) -> Result<Vec<u8>> {
    assemble(version_string, entries, &[], options)
}

/// Placement of one entry in the output buffer.
struct Placement {
    offset: usize,
    payload_offset: u32,
    payload_size: u32,
    /// First byte after this entry's descriptor and inline payload
    end: usize,
}

fn assemble(
    version_string: &str,
    entries: &[BuildEntry],
    regions: &[Region],
    options: &BuildOptions,
) -> Result<Vec<u8>> {
    debug!(
        "Building PDS '{}' with {} descriptors and {} regions",
        version_string,
        entries.len(),
        regions.len()
    );

    if entries.len() > options.max_descriptors {
        return Err(PdsError::TooManyDescriptors {
            count: entries.len(),
            max: options.max_descriptors,
        });
    }

    let mut header = Header::new().with_version_string(version_string);
    header.version = options.format_version;
    header.validate()?;

    let placements = layout(entries)?;
    check_regions(regions, &placements)?;

    let total = placements
        .iter()
        .map(|p| p.end)
        .chain(regions.iter().map(|r| r.span().end))
        .fold(HEADER_SIZE, usize::max);
    if total > u32::MAX as usize {
        return Err(PdsError::StoreTooLarge { size: total });
    }
    let mut buf = vec![0u8; total];

    for region in regions {
        buf[region.span()].copy_from_slice(&region.bytes);
    }

    for (i, (entry, placed)) in entries.iter().zip(&placements).enumerate() {
        let next = placements.get(i + 1).map(|p| p.offset as u32).unwrap_or(0);
        let desc = Descriptor::new(entry.type_id, placed.payload_offset, placed.payload_size, next);
        buf[placed.offset..placed.offset + DESCRIPTOR_HEADER_SIZE].copy_from_slice(&desc.to_bytes());

        if let PayloadSource::Inline(bytes) = &entry.payload {
            let start = placed.payload_offset as usize;
            buf[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }

    // Absolute payload references must land inside the finished store
    let reader = ByteReader::new(&buf);
    for placed in &placements {
        reader.range(placed.payload_offset as usize, placed.payload_size as usize)?;
    }

    header.first_descriptor_offset = placements.first().map(|p| p.offset as u32).unwrap_or(0);
    buf[..HEADER_SIZE].copy_from_slice(&header.to_bytes()?);

    debug!("Built PDS of {} bytes", buf.len());
    Ok(buf)
}

fn layout(entries: &[BuildEntry]) -> Result<Vec<Placement>> {
    let mut placed: Vec<Placement> = Vec::with_capacity(entries.len());
    let mut cursor = HEADER_SIZE;

    for (index, entry) in entries.iter().enumerate() {
        let offset = match entry.offset {
            None => align_up(cursor),
            Some(pinned) => {
                let pinned = pinned as usize;
                if pinned < cursor || pinned % DESCRIPTOR_ALIGNMENT != 0 {
                    return Err(PdsError::InvalidPlacement {
                        index,
                        offset: pinned as u32,
                    });
                }
                pinned
            }
        };
        let header_end = offset + DESCRIPTOR_HEADER_SIZE;

        let (payload_offset, payload_size, end) = match &entry.payload {
            PayloadSource::Inline(bytes) => {
                let end = header_end
                    .checked_add(bytes.len())
                    .ok_or(PdsError::StoreTooLarge { size: usize::MAX })?;
                (header_end, bytes.len(), end)
            }
            // Only earlier entries have been placed
            PayloadSource::SharedWith(target) => {
                let source = placed.get(*target).ok_or(PdsError::InvalidSharedPayload {
                    index,
                    target: *target,
                })?;
                (
                    source.payload_offset as usize,
                    source.payload_size as usize,
                    header_end,
                )
            }
            PayloadSource::At { offset, size } => (*offset as usize, *size as usize, header_end),
        };

        if end > u32::MAX as usize {
            return Err(PdsError::StoreTooLarge { size: end });
        }

        placed.push(Placement {
            offset,
            payload_offset: payload_offset as u32,
            payload_size: payload_size as u32,
            end,
        });
        cursor = end;
    }

    Ok(placed)
}

/// Reject regions overlapping the header, an entry, or an earlier region.
fn check_regions(regions: &[Region], placements: &[Placement]) -> Result<()> {
    let mut taken: Vec<Range<usize>> = Vec::with_capacity(1 + placements.len() + regions.len());
    taken.push(0..HEADER_SIZE);
    taken.extend(placements.iter().map(|p| p.offset..p.end));

    for region in regions {
        let span = region.span();
        if span.is_empty() {
            continue;
        }
        if taken.iter().any(|t| span.start < t.end && t.start < span.end) {
            return Err(PdsError::OverlappingRegion {
                offset: region.offset,
                len: region.bytes.len(),
            });
        }
        taken.push(span);
    }

    Ok(())
}
