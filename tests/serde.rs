#![cfg(feature = "serde")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use serde::de::value::Error;
use serde::de::IntoDeserializer;
use serde::Deserialize;

use cbor_canon::{BigInt, CborMap, CborValue};

fn from<'de, D: IntoDeserializer<'de, Error>>(input: D) -> CborValue {
    CborValue::deserialize(input.into_deserializer()).unwrap()
}

#[test]
fn scalars_deserialize() {
    assert_eq!(from(true), CborValue::Bool(true));
    assert_eq!(from(-5i64), CborValue::from(-5));
    assert_eq!(from(u64::MAX), CborValue::from(u64::MAX));
    assert_eq!(from(1.5f64), CborValue::Float(1.5));
    assert_eq!(from("hi"), CborValue::from("hi"));
    assert_eq!(from(()), CborValue::Null);
    assert_eq!(
        from(u128::from(u64::MAX) + 1),
        CborValue::from(BigInt::from(1u8) << 64u32)
    );
}

#[test]
fn containers_deserialize() {
    assert_eq!(
        from(vec![1i64, 2, 3]),
        CborValue::Array(vec![
            CborValue::from(1),
            CborValue::from(2),
            CborValue::from(3)
        ])
    );

    let mut source = BTreeMap::new();
    source.insert("b".to_owned(), 2i64);
    source.insert("a".to_owned(), 1i64);
    let mut expected = CborMap::new();
    expected.insert("a", 1);
    expected.insert("b", 2);
    assert_eq!(from(source), CborValue::Map(expected));
}
