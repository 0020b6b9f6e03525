// Property-based round trips for the codec, the canonical form and the JSON number reader.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;

use cbor_canon::json::{format_f64, parse_json_number};
use cbor_canon::{
    canonical_encode, decode, decode_sequence, encode, BigInt, CborMap, CborNumber, CborOptions,
    CborValue, DecodeLimits, JsonOptions, NumberConversion,
};

fn arb_bigint() -> impl Strategy<Value = BigInt> {
    (any::<bool>(), proptest::collection::vec(any::<u8>(), 9..24)).prop_map(|(neg, mut mag)| {
        if mag[0] == 0 {
            mag[0] = 1;
        }
        let b = BigInt::from_bytes_be(num_bigint::Sign::Plus, &mag);
        if neg {
            -b
        } else {
            b
        }
    })
}

fn arb_simple() -> impl Strategy<Value = u8> {
    prop_oneof![0u8..=19, 32u8..=255]
}

fn arb_leaf() -> impl Strategy<Value = CborValue> {
    prop_oneof![
        any::<i64>().prop_map(CborValue::from),
        any::<u64>().prop_map(CborValue::from),
        arb_bigint().prop_map(CborValue::from),
        proptest::collection::vec(any::<u8>(), 0..48).prop_map(CborValue::Bytes),
        "\\PC{0,24}".prop_map(CborValue::Text),
        any::<bool>().prop_map(CborValue::Bool),
        Just(CborValue::Null),
        Just(CborValue::Undefined),
        arb_simple().prop_map(CborValue::Simple),
        any::<f64>()
            .prop_filter("NaN payloads are not preserved", |f| !f.is_nan())
            .prop_map(CborValue::Float),
    ]
}

fn arb_value() -> impl Strategy<Value = CborValue> {
    arb_leaf().prop_recursive(4, 128, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(CborValue::Array),
            proptest::collection::vec(("[a-z]{0,6}", inner.clone()), 0..8).prop_map(|pairs| {
                let mut m = CborMap::new();
                for (k, v) in pairs {
                    m.insert(k, v);
                }
                CborValue::Map(m)
            }),
            (1000u64..5000, inner).prop_map(|(t, v)| CborValue::tagged(t, v)),
        ]
    })
}

fn reversed(value: &CborValue) -> CborValue {
    match value {
        CborValue::Array(items) => CborValue::Array(items.iter().map(reversed).collect()),
        CborValue::Map(map) => {
            let mut out = CborMap::new();
            let entries: Vec<_> = map.iter().collect();
            for (k, v) in entries.into_iter().rev() {
                out.insert(k.clone(), reversed(v));
            }
            CborValue::Map(out)
        }
        CborValue::Tag(t, inner) => CborValue::tagged(*t, reversed(inner)),
        other => other.clone(),
    }
}

proptest! {
    #[test]
    fn encode_decode_round_trip(v in arb_value()) {
        let opts = CborOptions::default();
        let bytes = encode(&v, &opts).unwrap();
        let decoded = decode(&bytes, &opts, DecodeLimits::for_bytes(bytes.len())).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn indefinite_strings_decode_to_the_same_value(v in arb_value()) {
        let opts = CborOptions { use_indef_length_strings: true, ..CborOptions::default() };
        let bytes = encode(&v, &opts).unwrap();
        let decoded = decode(&bytes, &opts, DecodeLimits::default()).unwrap();
        prop_assert_eq!(decoded, v);
    }

    #[test]
    fn sequences_split_where_they_were_joined(a in arb_value(), b in arb_value()) {
        let opts = CborOptions::default();
        let mut bytes = encode(&a, &opts).unwrap();
        bytes.extend(encode(&b, &opts).unwrap());
        let items = decode_sequence(&bytes, &opts, DecodeLimits::default()).unwrap();
        prop_assert_eq!(items, vec![a, b]);
    }

    #[test]
    fn canonical_form_ignores_insertion_order(v in arb_value()) {
        let a = canonical_encode(&v).unwrap();
        let b = canonical_encode(&reversed(&v)).unwrap();
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn canonical_form_is_a_fixed_point(v in arb_value()) {
        let once = canonical_encode(&v).unwrap();
        let reparsed = decode(once.as_bytes(), &CborOptions::default(), DecodeLimits::default()).unwrap();
        let twice = canonical_encode(&reparsed).unwrap();
        prop_assert_eq!(once.as_bytes(), twice.as_bytes());

        let via_option = encode(&v, &CborOptions::canonical()).unwrap();
        prop_assert_eq!(via_option.as_slice(), once.as_bytes());
    }

    #[test]
    fn json_integers_stay_exact(i in any::<i64>()) {
        prop_assert_eq!(
            parse_json_number(&i.to_string(), &JsonOptions::default()),
            Some(CborNumber::Int64(i))
        );
    }

    #[test]
    fn json_doubles_round_trip(f in proptest::num::f64::NORMAL) {
        let opts = JsonOptions { number_conversion: NumberConversion::Double, ..JsonOptions::default() };
        let parsed = parse_json_number(&format_f64(f), &opts).unwrap();
        prop_assert_eq!(parsed.to_f64().to_bits(), f.to_bits());
        prop_assert_eq!(
            parse_json_number(&format_f64(f), &JsonOptions::default()).unwrap().to_f64().to_bits(),
            f.to_bits()
        );
    }
}
