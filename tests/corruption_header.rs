//! Header corruption and compatibility tests
//!
//! Verifies that damaged headers are rejected with the right error, and that
//! headers and descriptors from newer or older layouts still parse.

use pds::{
    build, checksum, parse, BuildEntry, Descriptor, Document, ErrorKind, PdsBuilder, PdsError,
    TypeId, DEFAULT_MAX_DESCRIPTORS, HEADER_SIZE, PDS_MAGIC,
};

/// Helper: hand-encoded header of any declared size, with a valid checksum
fn raw_header(header_size: u32, first: u32, version_string: &[u8]) -> Vec<u8> {
    let size = header_size as usize;
    let mut buf = vec![0u8; size.max(20)];
    buf[0..4].copy_from_slice(&PDS_MAGIC.to_le_bytes());
    buf[4..8].copy_from_slice(&header_size.to_le_bytes());
    buf[12..16].copy_from_slice(&1u32.to_le_bytes());
    buf[16..20].copy_from_slice(&first.to_le_bytes());
    let n = version_string.len().min(buf.len() - 20);
    buf[20..20 + n].copy_from_slice(&version_string[..n]);
    buf.truncate(size.max(16));
    reseal(&mut buf, size);
    buf
}

/// Helper: recompute the checksum over `[12, header_size)`
fn reseal(buf: &mut [u8], header_size: usize) {
    let crc = checksum(&buf[12..header_size]);
    buf[8..12].copy_from_slice(&crc.to_le_bytes());
}

fn sample_store() -> Vec<u8> {
    build(
        "v1.0",
        &[
            BuildEntry::inline(TypeId([0x00; 16]), b"A".to_vec()),
            BuildEntry::inline(TypeId([0x01; 16]), b"BB".to_vec()),
        ],
    )
    .unwrap()
}

#[test]
fn test_wrong_magic() {
    let mut buf = sample_store();
    buf[0..4].copy_from_slice(&0x1234_5678u32.to_le_bytes());
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err(),
        PdsError::InvalidMagic {
            found: 0x1234_5678,
            expected: PDS_MAGIC,
        }
    );
}

#[test]
fn test_empty_and_tiny_buffers() {
    for len in 0..4 {
        let err = parse(&sample_store()[..len], DEFAULT_MAX_DESCRIPTORS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds, "length {}", len);
    }
}

#[test]
fn test_checksum_field_corrupted() {
    let mut buf = sample_store();
    buf[8] ^= 0x80;
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err().kind(),
        ErrorKind::ChecksumMismatch
    );
}

#[test]
fn test_first_offset_corrupted() {
    // The checksum covers the chain entry point
    let mut buf = sample_store();
    buf[16] ^= 0x04;
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err().kind(),
        ErrorKind::ChecksumMismatch
    );
}

#[test]
fn test_header_size_below_minimum() {
    let mut buf = sample_store();
    buf[4..8].copy_from_slice(&8u32.to_le_bytes());
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err(),
        PdsError::HeaderTooSmall {
            found: 8,
            minimum: 16,
        }
    );
}

#[test]
fn test_header_size_past_buffer() {
    let mut buf = raw_header(HEADER_SIZE as u32, 0, b"v1.0");
    buf[4..8].copy_from_slice(&1024u32.to_le_bytes());
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err().kind(),
        ErrorKind::OutOfBounds
    );
}

#[test]
fn test_truncated_store() {
    let buf = sample_store();
    assert_eq!(
        parse(&buf[..HEADER_SIZE - 1], DEFAULT_MAX_DESCRIPTORS)
            .unwrap_err()
            .kind(),
        ErrorKind::OutOfBounds
    );
    // Header intact, second descriptor's payload cut short
    let err = parse(&buf[..buf.len() - 1], DEFAULT_MAX_DESCRIPTORS).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedChain);
    assert_eq!(err.root_cause().kind(), ErrorKind::OutOfBounds);
}

#[test]
fn test_format_version_zero() {
    let mut buf = sample_store();
    buf[12..16].copy_from_slice(&0u32.to_le_bytes());
    reseal(&mut buf, HEADER_SIZE);
    assert_eq!(
        parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err(),
        PdsError::UnsupportedVersion {
            found: 0,
            minimum: 1,
        }
    );
}

#[test]
fn test_future_header_size_200() {
    let mut buf = raw_header(200, 200, b"v9.9");
    // Unknown field in the header extension
    buf[180..184].copy_from_slice(&0xCAFE_F00Du32.to_le_bytes());
    reseal(&mut buf, 200);

    let desc = Descriptor::new(TypeId([0x42; 16]), 232, 3, 0);
    buf.extend_from_slice(&desc.to_bytes());
    buf.extend_from_slice(b"new");

    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap();
    assert_eq!(doc.header().header_size, 200);
    assert_eq!(doc.header().version_string, "v9.9");
    assert_eq!(doc.len(), 1);
    assert_eq!(doc.as_slice()[0].offset, 200);
    assert_eq!(doc.as_slice()[0].payload, b"new");
}

#[test]
fn test_legacy_header_size_16() {
    let buf = raw_header(16, 0, b"");
    assert_eq!(buf.len(), 16);

    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap();
    assert_eq!(doc.header().first_descriptor_offset, 0);
    assert_eq!(doc.header().version_string, "");
    assert!(doc.is_empty());
}

#[test]
fn test_partial_version_string() {
    // Declared size cuts the string at byte 26
    let mut buf = raw_header(26, 0, b"release-1.2.3");
    buf.resize(64, 0xEE);
    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap();
    assert_eq!(doc.header().version_string, "releas");
}

#[test]
fn test_non_utf8_version_string() {
    let buf = raw_header(HEADER_SIZE as u32, 0, &[b'v', 0xFF, b'1']);
    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap();
    assert_eq!(doc.header().version_string, "v\u{FFFD}1");
}

#[test]
fn test_larger_descriptor_record() {
    let mut buf = raw_header(HEADER_SIZE as u32, 148, b"v1.0");

    // 48-byte record: known fields plus 16 bytes of a newer layout
    let mut record = Descriptor::new(TypeId([7; 16]), 148 + 48, 2, 0).to_bytes().to_vec();
    record[0..4].copy_from_slice(&48u32.to_le_bytes());
    record.extend_from_slice(&[0xAA; 16]);
    buf.extend_from_slice(&record);
    buf.extend_from_slice(b"ok");

    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap();
    let entry = &doc.as_slice()[0];
    assert_eq!(entry.descriptor.header_size, 48);
    assert_eq!(entry.type_id(), TypeId([7; 16]));
    assert_eq!(entry.payload, b"ok");
}

#[test]
fn test_undersized_descriptor_record() {
    let mut buf = sample_store();
    buf[148..152].copy_from_slice(&20u32.to_le_bytes());
    let err = parse(&buf, DEFAULT_MAX_DESCRIPTORS).unwrap_err();
    assert_eq!(
        err.root_cause(),
        &PdsError::DescriptorTooSmall {
            offset: 148,
            found: 20,
            minimum: 32,
        }
    );
}

#[test]
fn test_unaligned_input_buffer() {
    let buf = sample_store();

    // Shift the store by one byte so no field is naturally aligned
    let mut backing = vec![0u8; buf.len() + 1];
    backing[1..].copy_from_slice(&buf);
    let shifted = &backing[1..];

    let doc = parse(shifted, DEFAULT_MAX_DESCRIPTORS).unwrap();
    let payloads: Vec<&[u8]> = doc.entries().map(|e| e.payload).collect();
    assert_eq!(payloads, vec![&b"A"[..], b"BB"]);
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut buf = sample_store();
    buf.extend_from_slice(&[0xFF; 64]);
    let doc = Document::parse(&buf).unwrap();
    assert_eq!(doc.len(), 2);
}

#[test]
fn test_descriptor_damage_not_covered_by_checksum() {
    // Payload bytes are not checksummed; damage there is returned as-is
    let mut buf = PdsBuilder::new()
        .descriptor(TypeId([1; 16]), b"abcd".to_vec())
        .build()
        .unwrap();
    buf[180] = b'X';
    let doc = Document::parse(&buf).unwrap();
    assert_eq!(doc.as_slice()[0].payload, b"Xbcd");
}
