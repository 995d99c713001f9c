//! Whole-store validation
//!
//! [`parse`] decodes the header, walks the full chain and resolves every
//! payload before returning. Any failure rejects the whole store: callers
//! never see a partially validated document.
//!
//! The buffer is assumed to be authentic already (its digest checked against
//! a manifest by the caller). The header checksum only guards against
//! format or tooling mismatches, not tampering.

use crate::accessor::ByteReader;
use crate::chain::{ChainWalker, Entry};
use crate::config::ParseOptions;
use crate::error::Result;
use crate::header::Header;
use crate::type_id::TypeId;
use tracing::{debug, warn};

/// A validated store, borrowing the buffer it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    buffer: &'a [u8],
    header: Header,
    entries: Vec<Entry<'a>>,
}

impl<'a> Document<'a> {
    /// Parse with the default [`ParseOptions`]
    pub fn parse(buffer: &'a [u8]) -> Result<Self> {
        parse_with(buffer, &ParseOptions::default())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Entries in chain order, including types the caller does not know
    pub fn entries(&self) -> std::slice::Iter<'_, Entry<'a>> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Entry<'a>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The buffer this document borrows from
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buffer
    }

    /// First entry of the given type
    pub fn find(&self, type_id: TypeId) -> Option<&Entry<'a>> {
        self.entries.iter().find(|e| e.type_id() == type_id)
    }

    /// All entries of the given type, in chain order
    pub fn find_all(&self, type_id: TypeId) -> impl Iterator<Item = &Entry<'a>> + '_ {
        self.entries.iter().filter(move |e| e.type_id() == type_id)
    }
}

impl<'a, 'd> IntoIterator for &'d Document<'a> {
    type Item = &'d Entry<'a>;
    type IntoIter = std::slice::Iter<'d, Entry<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Decode and fully validate a store.
pub fn parse(buffer: &[u8], max_descriptors: usize) -> Result<Document<'_>> {
    parse_with(buffer, &ParseOptions::new().with_max_descriptors(max_descriptors))
}

pub fn parse_with<'a>(buffer: &'a [u8], options: &ParseOptions) -> Result<Document<'a>> {
    debug!(
        "Parsing PDS buffer of {} bytes (max {} descriptors)",
        buffer.len(),
        options.max_descriptors
    );

    let result = decode_store(buffer, options);
    match &result {
        Ok(doc) => debug!(
            "Parsed PDS '{}' with {} descriptors",
            doc.header.version_string,
            doc.entries.len()
        ),
        Err(err) => warn!("Rejected PDS buffer: {}", err),
    }
    result
}

fn decode_store<'a>(buffer: &'a [u8], options: &ParseOptions) -> Result<Document<'a>> {
    let reader = ByteReader::new(buffer);
    let header = Header::decode(&reader)?;
    let entries = ChainWalker::new(reader, &header, options.max_descriptors).collect_entries()?;

    Ok(Document {
        buffer,
        header,
        entries,
    })
}

/// Find the payload of the first descriptor of `type_id`.
///
/// Validates the header, then walks the chain only as far as the first
/// match. Records after the match are not examined, so a store that
/// [`parse`] would reject can still yield a payload here.
pub fn find_descriptor(
    buffer: &[u8],
    type_id: TypeId,
    max_descriptors: usize,
) -> Result<Option<&[u8]>> {
    let reader = ByteReader::new(buffer);
    let header = Header::decode(&reader)?;

    for entry in ChainWalker::new(reader, &header, max_descriptors).walk() {
        let entry = entry?;
        if entry.type_id() == type_id {
            debug!("Found descriptor {} at offset {}", type_id, entry.offset);
            return Ok(Some(entry.payload));
        }
    }

    Ok(None)
}
