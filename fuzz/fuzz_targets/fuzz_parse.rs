#![no_main]
use libfuzzer_sys::fuzz_target;
use pds::{find_descriptor, parse, TypeId};

// Arbitrary bytes must never panic, and a parse that succeeds must respect
// the chain bound and yield in-bounds payloads.
fuzz_target!(|data: &[u8]| {
    let max = 32;

    if let Ok(doc) = parse(data, max) {
        assert!(doc.len() <= max);

        let mut prev = 0u32;
        for entry in doc.entries() {
            assert!(entry.offset > prev);
            prev = entry.offset;

            let start = entry.descriptor.payload_offset as usize;
            let end = start + entry.descriptor.payload_size as usize;
            assert_eq!(&data[start..end], entry.payload);
        }
    }

    let _ = find_descriptor(data, TypeId::NIL, max);
});
