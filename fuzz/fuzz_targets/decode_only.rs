#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_canon::{decode, CborOptions, DecodeLimits};

fuzz_target!(|data: &[u8]| {
    let mut limits = DecodeLimits::for_bytes(data.len());
    limits.max_depth = 64;
    let _ = decode(data, &CborOptions::default(), limits);

    let resolving = CborOptions {
        resolve_references: true,
        allow_duplicate_keys: true,
        ..CborOptions::default()
    };
    let _ = decode(data, &resolving, limits);
});
