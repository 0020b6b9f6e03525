#![no_main]

use libfuzzer_sys::fuzz_target;

use cbor_canon::{canonical_encode, decode, encode, CborOptions, DecodeLimits};

fuzz_target!(|data: &[u8]| {
    let mut limits = DecodeLimits::for_bytes(data.len());
    limits.max_depth = 64;
    let opts = CborOptions::default();
    let Ok(v) = decode(data, &opts, limits) else {
        return;
    };

    // Re-encoding a decoded value must decode to the same value.
    let bytes = encode(&v, &opts).expect("encode");
    let again = decode(&bytes, &opts, DecodeLimits::for_bytes(bytes.len())).expect("decode");
    assert_eq!(again, v);

    // The canonical form must be a fixed point.
    if let Ok(canon) = canonical_encode(&v) {
        let reparsed = decode(canon.as_bytes(), &opts, DecodeLimits::default()).expect("decode canonical");
        let twice = canonical_encode(&reparsed).expect("re-canonicalize");
        assert_eq!(twice.as_bytes(), canon.as_bytes());
    }
});
