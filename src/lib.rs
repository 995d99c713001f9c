//! # PDS - Platform Descriptor Store
//!
//! `pds` parses, validates and builds Platform Descriptor Store images: a
//! checksummed header followed by a forward-linked chain of descriptors, each
//! tagging an opaque payload with a 16-byte UUID type.
//!
//! - **Bounds-checked decoding** of every field, with no alignment
//!   requirements on the input buffer
//! - **Bounded traversal**: links must point forward and the chain length is
//!   capped (32 by default)
//! - **Forward/backward compatible** headers and descriptors: larger records
//!   are accepted, smaller headers fall back to defaults
//! - **Zero-copy documents** borrowing payloads from the input buffer
//! - **Builder** producing conforming images, including shared payloads
//!
//! The buffer handed to [`parse`] is expected to be authentic already, for
//! example checked against a digest in a signed manifest. The header checksum
//! here detects format mismatches and accidental damage, nothing more.
//!
//! ## Quick Start
//!
//! ```rust
//! use pds::{parse, PdsBuilder, TypeId, DEFAULT_MAX_DESCRIPTORS};
//!
//! # fn main() -> pds::Result<()> {
//! let calibration: TypeId = "5319d6f1-57b3-4d1a-96c6-e0edaf907a12".parse().unwrap();
//!
//! let image = PdsBuilder::new()
//!     .version_string("v1.0")
//!     .descriptor(calibration, b"\x01\x02\x03".to_vec())
//!     .build()?;
//!
//! let doc = parse(&image, DEFAULT_MAX_DESCRIPTORS)?;
//! for entry in doc.entries() {
//!     // Unknown types are the caller's to skip
//!     if entry.type_id() == calibration {
//!         assert_eq!(entry.payload, &[1, 2, 3]);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use self::core::{
    accessor, builder, chain, checksum, config, descriptor, document, error, header, manifest,
    type_id,
};

// Re-export core types that users need
pub use crate::core::{
    accessor::ByteReader,
    builder::{build, build_with, BuildEntry, PayloadSource, PdsBuilder},
    chain::{ChainWalker, Entry, Walk},
    checksum::{checksum, Checksum},
    config::{BuildOptions, ParseOptions, DEFAULT_MAX_DESCRIPTORS},
    descriptor::{decode_descriptor, Descriptor, DESCRIPTOR_ALIGNMENT, DESCRIPTOR_HEADER_SIZE},
    document::{find_descriptor, parse, parse_with, Document},
    error::{ErrorKind, ManifestError, PdsError, Result},
    header::{Header, HEADER_SIZE, PDS_HEADER_VERSION, PDS_MAGIC},
    manifest::Manifest,
    type_id::TypeId,
};
