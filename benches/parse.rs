//! Benchmarks for store validation and lookup

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pds::{checksum, find_descriptor, parse, PdsBuilder, TypeId, DEFAULT_MAX_DESCRIPTORS};

fn create_test_store(count: usize, payload_size: usize) -> Vec<u8> {
    let mut builder = PdsBuilder::new().version_string("bench");
    for i in 0..count {
        builder = builder.descriptor(TypeId([i as u8; 16]), vec![i as u8; payload_size]);
    }
    builder.build().unwrap()
}

fn benchmark_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("checksum");

    for size in [136, 4096, 65536].iter() {
        let data = vec![0xA5u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(checksum(black_box(data))));
        });
    }

    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for count in [0, 8, 32].iter() {
        let store = create_test_store(*count, 64);
        group.bench_with_input(BenchmarkId::from_parameter(count), &store, |b, store| {
            b.iter(|| {
                let doc = parse(black_box(store), DEFAULT_MAX_DESCRIPTORS).unwrap();
                black_box(doc.len());
            });
        });
    }

    group.finish();
}

fn benchmark_find_descriptor(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_descriptor");
    let store = create_test_store(32, 64);

    // First record versus last record of a full chain
    for index in [0u8, 31].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(index), index, |b, &index| {
            b.iter(|| {
                let payload =
                    find_descriptor(black_box(&store), TypeId([index; 16]), DEFAULT_MAX_DESCRIPTORS)
                        .unwrap();
                black_box(payload);
            });
        });
    }

    group.finish();
}

fn benchmark_reject_corrupt(c: &mut Criterion) {
    let mut store = create_test_store(32, 64);
    store[40] ^= 0xFF;

    c.bench_function("parse_reject_checksum", |b| {
        b.iter(|| black_box(parse(black_box(&store), DEFAULT_MAX_DESCRIPTORS).is_err()));
    });
}

criterion_group!(
    benches,
    benchmark_checksum,
    benchmark_parse,
    benchmark_find_descriptor,
    benchmark_reject_corrupt
);
criterion_main!(benches);
