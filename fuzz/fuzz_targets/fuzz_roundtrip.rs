#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pds::{build, parse, BuildEntry, TypeId, DEFAULT_MAX_DESCRIPTORS};

#[derive(Arbitrary, Debug)]
struct Input {
    version_string: String,
    entries: Vec<([u8; 16], Vec<u8>, Option<u8>)>,
}

fuzz_target!(|input: Input| {
    let entries: Vec<BuildEntry> = input
        .entries
        .into_iter()
        .enumerate()
        .map(|(i, (type_id, payload, share))| match share {
            Some(target) if i > 0 => BuildEntry::shared(TypeId(type_id), target as usize % i),
            _ => BuildEntry::inline(TypeId(type_id), payload),
        })
        .collect();

    // Too many entries or an unencodable version string
    let Ok(buf) = build(&input.version_string, &entries) else {
        return;
    };

    let doc = parse(&buf, DEFAULT_MAX_DESCRIPTORS).expect("built store must parse");
    assert_eq!(doc.len(), entries.len());
    assert_eq!(doc.header().version_string, input.version_string);
    for (entry, built) in doc.entries().zip(&entries) {
        assert_eq!(entry.type_id(), built.type_id);
    }
});
