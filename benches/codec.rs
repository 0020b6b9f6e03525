#![allow(clippy::unwrap_used)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use cbor_canon::json::from_json_str;
use cbor_canon::{
    canonical_encode, decode, encode, CborMap, CborOptions, CborValue, DecodeLimits, JsonOptions,
};

fn sample_small() -> Vec<u8> {
    vec![0xa1, 0x61, 0x61, 0x01] // {"a":1}
}

fn sample_medium() -> CborValue {
    let mut map = CborMap::new();
    for i in 0..64_i64 {
        map.insert(format!("k{i:03}"), i);
    }
    map.insert("blob", vec![0xabu8; 256]);
    map.insert("ratio", CborValue::Float(0.125));
    CborValue::Map(map)
}

fn sample_json() -> String {
    let rows: Vec<String> = (0..64)
        .map(|i| format!(r#"{{"id":{i},"name":"row {i}","score":{i}.5,"tags":["a","b"]}}"#))
        .collect();
    format!("[{}]", rows.join(","))
}

fn bench_decode(c: &mut Criterion) {
    let opts = CborOptions::default();
    let small = sample_small();
    let small_limits = DecodeLimits::for_bytes(small.len());

    c.bench_function("decode_small", |b| {
        b.iter(|| {
            decode(black_box(&small), &opts, small_limits).unwrap();
        })
    });

    let medium = encode(&sample_medium(), &opts).unwrap();
    let medium_limits = DecodeLimits::for_bytes(medium.len());

    c.bench_function("decode_medium", |b| {
        b.iter(|| {
            let v = decode(black_box(&medium), &opts, medium_limits).unwrap();
            black_box(v);
        })
    });
}

fn bench_encode(c: &mut Criterion) {
    let value = sample_medium();
    let opts = CborOptions::default();

    c.bench_function("encode_medium", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&value), &opts).unwrap();
            black_box(bytes);
        })
    });

    c.bench_function("canonical_encode_medium", |b| {
        b.iter(|| {
            let bytes = canonical_encode(black_box(&value)).unwrap();
            black_box(bytes);
        })
    });
}

fn bench_json(c: &mut Criterion) {
    let text = sample_json();
    let opts = JsonOptions::default();

    c.bench_function("json_parse_rows", |b| {
        b.iter(|| {
            let v = from_json_str(black_box(&text), &opts).unwrap();
            black_box(v);
        })
    });
}

criterion_group!(benches, bench_decode, bench_encode, bench_json);
criterion_main!(benches);
