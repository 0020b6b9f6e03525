#![allow(clippy::unwrap_used, clippy::expect_used)]

use core::cmp::Ordering;

use cbor_canon::json::from_json_str;
use cbor_canon::{
    canonical_encode, cmp_canonical_keys, decode, BigInt, CborMap, CborOptions, CborValue,
    DecodeLimits, ErrorCode, JsonOptions,
};
use hex_literal::hex;

fn canon(value: &CborValue) -> Vec<u8> {
    canonical_encode(value).unwrap().into_bytes()
}

#[test]
fn json_document_to_canonical_bytes() {
    let value = from_json_str(r#"{"b":[1.5,"x"],"a":1}"#, &JsonOptions::default()).unwrap();
    assert_eq!(
        canon(&value),
        hex!("a2 6161 01 6162 82 fb3ff8000000000000 6178")
    );
}

#[test]
fn map_keys_follow_canonical_order() {
    let mut map = CborMap::new();
    map.insert("aa", 1);
    map.insert(CborValue::Bytes(vec![0x01]), 2);
    map.insert(100, 3);
    map.insert("z", 4);
    map.insert(CborValue::Bytes(vec![0x00, 0x00]), 5);
    map.insert(-1, 6);
    map.insert(10, 7);
    assert_eq!(
        canon(&CborValue::Map(map)),
        hex!("a7 0a 07 1864 03 20 06 420000 05 4101 02 617a 04 626161 01")
    );
}

#[test]
fn insertion_order_does_not_matter() {
    let mut first = CborMap::new();
    first.insert("x", 1);
    first.insert("y", vec![CborValue::from(true)]);
    let mut second = CborMap::new();
    second.insert("y", vec![CborValue::from(true)]);
    second.insert("x", 1);
    assert_eq!(
        canon(&CborValue::Map(first)),
        canon(&CborValue::Map(second))
    );
}

#[test]
fn tags_are_dropped_at_every_level() {
    let value = CborValue::Array(vec![
        CborValue::tagged(0, "2013-03-21T20:04:00Z"),
        CborValue::tagged(37, vec![0u8; 2]),
        CborValue::tagged(55_799, CborValue::tagged(24, "x")),
    ]);
    assert_eq!(
        canon(&value),
        hex!("83 74 323031332d30332d32315432303a30343a30305a 42 0000 6178")
    );
}

#[test]
fn integers_keep_integer_headers() {
    assert_eq!(canon(&CborValue::from(u64::MAX)), hex!("1b ffffffffffffffff"));
    assert_eq!(
        canon(&CborValue::from(-(BigInt::from(1u8) << 64u32))),
        hex!("3b ffffffffffffffff")
    );
    assert_eq!(canon(&CborValue::tagged(2, vec![0x01u8])), hex!("01"));
    assert_eq!(canon(&CborValue::tagged(3, vec![0x01u8])), hex!("21"));
    assert_eq!(
        canon(&CborValue::tagged(
            30,
            vec![CborValue::from(6), CborValue::from(1)]
        )),
        hex!("06")
    );
}

#[test]
fn other_numbers_become_float64() {
    assert_eq!(canon(&CborValue::Float(1.5)), hex!("fb 3ff8000000000000"));
    assert_eq!(canon(&CborValue::Float(0.0)), hex!("fb 0000000000000000"));
    // 1.0 fits a half float, but canonical numbers are always float64.
    assert_eq!(canon(&CborValue::Float(1.0)), hex!("fb 3ff0000000000000"));
    assert_eq!(
        canon(&CborValue::from(BigInt::from(1u8) << 64u32)),
        hex!("fb 43f0000000000000")
    );
    assert_eq!(
        canon(&CborValue::tagged(
            30,
            vec![CborValue::from(1), CborValue::from(3)]
        )),
        hex!("fb 3fd5555555555555")
    );
    assert_eq!(
        canon(&CborValue::tagged(
            4,
            vec![CborValue::from(-1), CborValue::from(15)]
        )),
        hex!("fb 3ff8000000000000")
    );
    assert_eq!(
        canon(&CborValue::tagged(
            5,
            vec![CborValue::from(-1), CborValue::from(3)]
        )),
        hex!("fb 3ff8000000000000")
    );
}

#[test]
fn decimal_with_offsetting_huge_exponent_is_exact() {
    let mantissa = BigInt::from(10u8).pow(100_001u32);
    let value = CborValue::tagged(
        4,
        vec![CborValue::from(-100_001), CborValue::from(mantissa)],
    );
    assert_eq!(canon(&value), hex!("fb 3ff0000000000000"));
}

#[test]
fn simple_values() {
    let value = CborValue::Array(vec![
        CborValue::Bool(false),
        CborValue::Bool(true),
        CborValue::Null,
        CborValue::Undefined,
        CborValue::Simple(16),
        CborValue::Simple(200),
    ]);
    assert_eq!(canon(&value), hex!("86 f4 f5 f6 f7 f0 f8c8"));
}

#[test]
fn keys_colliding_after_tag_removal_are_rejected() {
    let mut map = CborMap::new();
    map.insert(CborValue::tagged(0, "x"), 1);
    map.insert("x", 2);
    let err = canonical_encode(&CborValue::Map(map)).unwrap_err();
    assert_eq!(err.code, ErrorCode::CanonicalInvariant);
}

#[test]
fn canonical_output_is_idempotent() {
    let mut map = CborMap::new();
    map.insert("k", CborValue::tagged(4, vec![CborValue::from(-2), CborValue::from(5)]));
    map.insert(CborValue::Float(-2.5), CborValue::Bytes(vec![9]));
    let value = CborValue::Map(map);
    let once = canon(&value);
    let reparsed = decode(&once, &CborOptions::default(), DecodeLimits::default()).unwrap();
    assert_eq!(canon(&reparsed), once);
}

#[test]
fn key_comparator() {
    let cmp = |a: CborValue, b: CborValue| cmp_canonical_keys(&a, &b).unwrap();
    assert_eq!(cmp(CborValue::from(10), CborValue::from(100)), Ordering::Less);
    assert_eq!(cmp(CborValue::from(-1), CborValue::from(1_000_000)), Ordering::Greater);
    assert_eq!(cmp(CborValue::from("z"), CborValue::from("aa")), Ordering::Less);
    assert_eq!(cmp(CborValue::from("b"), CborValue::from("a")), Ordering::Greater);
    assert_eq!(
        cmp(CborValue::Bytes(vec![0, 0]), CborValue::Bytes(vec![1])),
        Ordering::Less
    );
    assert_eq!(
        cmp(CborValue::tagged(1, "a"), CborValue::from("a")),
        Ordering::Equal
    );
}

#[test]
fn canonical_bytes_accessors() {
    let c = canonical_encode(&CborValue::from("hi")).unwrap();
    assert_eq!(c.len(), 3);
    assert!(!c.is_empty());
    assert_eq!(c.as_ref(), c.as_bytes());
    let bytes: Vec<u8> = c.into();
    assert_eq!(bytes, hex!("62 6869"));
}

#[cfg(feature = "sha2")]
#[test]
fn digest_is_stable_across_insertion_order() {
    let mut a = CborMap::new();
    a.insert("one", 1);
    a.insert("two", 2);
    let mut b = CborMap::new();
    b.insert("two", 2);
    b.insert("one", 1);
    let da = canonical_encode(&CborValue::Map(a)).unwrap().sha256();
    let db = canonical_encode(&CborValue::Map(b.clone())).unwrap().sha256();
    assert_eq!(da, db);

    b.insert("three", 3);
    let dc = canonical_encode(&CborValue::Map(b)).unwrap().sha256();
    assert_ne!(da, dc);

    let empty = canonical_encode(&CborValue::Map(CborMap::new())).unwrap();
    assert_eq!(empty.as_bytes(), hex!("a0"));
}
