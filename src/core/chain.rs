//! Descriptor chain traversal
//!
//! The chain starts at the header's `first_descriptor_offset` and follows
//! `next_descriptor_offset` links until a 0 link. Every link must point
//! strictly forward, so no offset is ever visited twice, and the number of
//! records visited is capped by `max_descriptors`. Together these bound a
//! walk to `max_descriptors + 1` steps without any cycle detection.

use crate::accessor::ByteReader;
use crate::descriptor::{decode_descriptor, Descriptor};
use crate::error::{PdsError, Result};
use crate::header::Header;
use crate::type_id::TypeId;
use std::iter::FusedIterator;
use tracing::trace;

/// One validated descriptor, borrowing its payload from the store buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Byte offset of the descriptor header within the store
    pub offset: u32,
    pub descriptor: Descriptor,
    pub payload: &'a [u8],
}

impl<'a> Entry<'a> {
    pub fn type_id(&self) -> TypeId {
        self.descriptor.descriptor_type
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

/// Restartable walker over a store's descriptor chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainWalker<'a> {
    reader: ByteReader<'a>,
    first: u32,
    max_descriptors: usize,
}

impl<'a> ChainWalker<'a> {
    pub fn new(reader: ByteReader<'a>, header: &Header, max_descriptors: usize) -> Self {
        Self::from_offset(reader, header.first_descriptor_offset, max_descriptors)
    }

    /// Walker starting at an explicit first-record offset (0 = empty chain).
    pub fn from_offset(reader: ByteReader<'a>, first: u32, max_descriptors: usize) -> Self {
        ChainWalker {
            reader,
            first,
            max_descriptors,
        }
    }

    /// Start a new traversal from the first record.
    pub fn walk(&self) -> Walk<'a> {
        Walk {
            reader: self.reader,
            cursor: match self.first {
                0 => None,
                offset => Some(offset),
            },
            prev: None,
            visited: 0,
            max_descriptors: self.max_descriptors,
            done: false,
        }
    }

    /// Walk the whole chain, stopping at the first error.
    pub fn collect_entries(&self) -> Result<Vec<Entry<'a>>> {
        self.walk().collect()
    }
}

/// A single traversal. Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    reader: ByteReader<'a>,
    cursor: Option<u32>,
    prev: Option<u32>,
    visited: usize,
    max_descriptors: usize,
    done: bool,
}

impl<'a> Walk<'a> {
    /// Number of records yielded so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    fn fail(&mut self, err: PdsError) -> Option<Result<Entry<'a>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Result<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let offset = match self.cursor {
            Some(offset) => offset,
            None => {
                self.done = true;
                return None;
            }
        };

        if let Some(prev) = self.prev {
            if offset <= prev {
                return self.fail(PdsError::NonMonotonicChain { offset: prev, next: offset });
            }
        }

        if self.visited >= self.max_descriptors {
            return self.fail(PdsError::ChainTooLong {
                max: self.max_descriptors,
            });
        }

        let (descriptor, payload) = match decode_descriptor(&self.reader, offset) {
            Ok(decoded) => decoded,
            Err(source) => {
                return self.fail(PdsError::MalformedChain {
                    offset,
                    source: Box::new(source),
                });
            }
        };

        trace!(
            "Descriptor at {}: type {}, payload {} bytes at {}",
            offset,
            descriptor.descriptor_type,
            descriptor.payload_size,
            descriptor.payload_offset
        );

        self.visited += 1;
        self.prev = Some(offset);
        self.cursor = descriptor.next_descriptor();

        Some(Ok(Entry {
            offset,
            descriptor,
            payload,
        }))
    }
}

impl FusedIterator for Walk<'_> {}
