#![allow(clippy::unwrap_used, clippy::expect_used)]

use cbor_canon::tags::{bignum, fraction, rational, uri};
use cbor_canon::{
    BigInt, CborError, CborInteger, CborMap, CborNumber, CborValue, DateTimeFields, ErrorCode,
    TagHandler, TagRegistry, TypeFilter, Uuid,
};

fn arr(items: Vec<CborValue>) -> CborValue {
    CborValue::Array(items)
}

fn pair(a: impl Into<CborValue>, b: impl Into<CborValue>) -> CborValue {
    arr(vec![a.into(), b.into()])
}

fn validate(value: &CborValue) -> Result<CborValue, CborError> {
    TagRegistry::with_defaults().validate(value)
}

fn validate_code(value: &CborValue) -> ErrorCode {
    validate(value).unwrap_err().code
}

const SAMPLE_UUID: &str = "550e8400-e29b-41d4-a716-446655440000";
const SAMPLE_UUID_BYTES: [u8; 16] = [
    0x55, 0x0e, 0x84, 0x00, 0xe2, 0x9b, 0x41, 0xd4, 0xa7, 0x16, 0x44, 0x66, 0x55, 0x44, 0x00, 0x00,
];

#[test]
fn bignums_normalize_to_integers() {
    assert_eq!(
        validate(&CborValue::tagged(2, vec![0x01u8])).unwrap(),
        CborValue::from(1)
    );
    assert_eq!(
        validate(&CborValue::tagged(3, vec![0x01u8])).unwrap(),
        CborValue::from(-2)
    );
    assert_eq!(
        validate_code(&CborValue::tagged(2, "01")),
        ErrorCode::TagPayloadType
    );
}

#[test]
fn bignum_helpers() {
    assert_eq!(bignum::integer_from_bytes(true, &[0x01]), CborInteger::from(-2));
    assert_eq!(bignum::integer_from_bytes(false, &[]), CborInteger::from(0));
    let big = CborInteger::from(BigInt::from(1u8) << 64u32);
    assert_eq!(
        bignum::encode(&big),
        CborValue::tagged(2, vec![1u8, 0, 0, 0, 0, 0, 0, 0, 0])
    );
    assert_eq!(
        bignum::decode(&bignum::encode(&big)).unwrap(),
        CborValue::Integer(big)
    );
    assert_eq!(
        bignum::decode(&CborValue::from(1)).unwrap_err().code,
        ErrorCode::TagPayloadType
    );
}

#[test]
fn rationals_reduce_and_collapse() {
    assert_eq!(
        validate(&CborValue::tagged(30, pair(6, 1))).unwrap(),
        CborValue::from(6)
    );
    assert_eq!(
        validate(&CborValue::tagged(30, pair(6, 2))).unwrap(),
        CborValue::from(3)
    );
    assert_eq!(
        validate(&CborValue::tagged(30, pair(2, 4))).unwrap(),
        CborValue::tagged(30, pair(1, 2))
    );
    assert_eq!(
        validate(&CborValue::tagged(30, pair(-3, 9))).unwrap(),
        CborValue::tagged(30, pair(-1, 3))
    );
}

#[test]
fn rational_payload_errors() {
    assert_eq!(
        validate_code(&CborValue::tagged(30, pair(1, 0))),
        ErrorCode::TagDenominator
    );
    assert_eq!(
        validate_code(&CborValue::tagged(30, pair(1, -1))),
        ErrorCode::TagPayloadType
    );
    assert_eq!(
        validate_code(&CborValue::tagged(30, arr(vec![CborValue::from(1)]))),
        ErrorCode::TagPayloadType
    );
    assert_eq!(
        rational::rational_from_payload(&arr(vec![CborValue::from(1)]))
            .unwrap_err()
            .code,
        ErrorCode::TagArrayLength
    );
    assert_eq!(
        rational::rational_from_payload(&pair(1.5, 2)).unwrap_err().code,
        ErrorCode::TagNonIntegral
    );
}

#[test]
fn decimal_fractions() {
    assert_eq!(
        validate(&CborValue::tagged(4, pair(0, 5))).unwrap(),
        CborValue::from(5)
    );
    let kept = CborValue::tagged(4, pair(-1, 15));
    assert_eq!(validate(&kept).unwrap(), kept);
    assert_eq!(
        validate_code(&CborValue::tagged(4, pair(1.5, 2))),
        ErrorCode::TagPayloadType
    );

    let d = fraction::decimal_from_payload(&pair(-2, 27_315), false).unwrap();
    assert_eq!(d.to_string(), "273.15");
    let b = fraction::bigfloat_from_payload(&pair(-1, 3), false).unwrap();
    assert_eq!(b.to_string(), "1.5");
}

#[test]
fn bignum_exponents_need_the_extended_tags() {
    let two_64 = CborValue::tagged(2, vec![1u8, 0, 0, 0, 0, 0, 0, 0, 0]);
    let payload = arr(vec![two_64.clone(), CborValue::from(1)]);
    assert_eq!(
        validate_code(&CborValue::tagged(4, payload.clone())),
        ErrorCode::TagPayloadType
    );
    assert_eq!(
        fraction::decimal_from_payload(&payload, false).unwrap_err().code,
        ErrorCode::TagExponentTooLarge
    );

    let normalized = validate(&CborValue::tagged(264, payload)).unwrap();
    assert_eq!(
        normalized,
        CborValue::tagged(
            264,
            pair(BigInt::from(1u8) << 64u32, 1)
        )
    );
}

#[test]
fn date_strings() {
    let ok = CborValue::tagged(0, "2013-03-21T20:04:00Z");
    assert_eq!(validate(&ok).unwrap(), ok);
    assert_eq!(
        validate_code(&CborValue::tagged(0, "2013-02-30T00:00:00Z")),
        ErrorCode::TagDateFormat
    );
    assert_eq!(
        validate_code(&CborValue::tagged(0, 5)),
        ErrorCode::TagPayloadType
    );
}

#[test]
fn epoch_dates() {
    let ok = CborValue::tagged(1, 1_363_896_240);
    assert_eq!(validate(&ok).unwrap(), ok);
    assert!(validate(&CborValue::tagged(1, 1_363_896_240.5)).is_ok());
    assert_eq!(
        validate_code(&CborValue::tagged(1, f64::NAN)),
        ErrorCode::TagPayloadType
    );
    assert_eq!(
        validate_code(&CborValue::tagged(1, "now")),
        ErrorCode::TagPayloadType
    );
}

#[test]
fn iris() {
    for ok in [
        "http://example.com/a?b=c#d",
        "urn:isbn:0451450523",
        "//host:8080/path",
        "relative/path",
        "https://\u{00e9}xample.org/\u{4e2d}",
    ] {
        assert!(uri::is_valid_iri(ok), "{ok}");
    }
    for bad in ["1abc:foo", "http://ex ample.com/", "a:b#c#d"] {
        assert!(!uri::is_valid_iri(bad), "{bad}");
    }
    assert_eq!(
        validate_code(&CborValue::tagged(32, "1abc:foo")),
        ErrorCode::TagUriInvalid
    );
}

#[test]
fn uuid_strings_and_bytes() {
    let u: Uuid = SAMPLE_UUID.parse().unwrap();
    assert_eq!(u.as_bytes(), &SAMPLE_UUID_BYTES);
    assert_eq!(u.to_string(), SAMPLE_UUID);
    assert_eq!(SAMPLE_UUID.to_uppercase().parse::<Uuid>().unwrap(), u);

    let v = u.to_value();
    assert_eq!(v, CborValue::tagged(37, SAMPLE_UUID_BYTES.to_vec()));
    assert_eq!(Uuid::from_value(&v).unwrap(), u);
    assert_eq!(validate(&v).unwrap(), v);

    for bad in [
        "550e8400e29b41d4a716446655440000",
        "550e8400-e29b-41d4-a716-44665544000g",
        "550e8400-e29b-41d4-a716_446655440000",
    ] {
        assert_eq!(bad.parse::<Uuid>().unwrap_err().code, ErrorCode::UuidString);
    }
}

#[test]
fn uuid_mixed_endian() {
    let u = Uuid::from_bytes(SAMPLE_UUID_BYTES);
    let mixed = u.to_mixed_endian();
    assert_eq!(&mixed[..8], &[0x00, 0x84, 0x0e, 0x55, 0x9b, 0xe2, 0xd4, 0x41]);
    assert_eq!(&mixed[8..], &SAMPLE_UUID_BYTES[8..]);
    assert_eq!(Uuid::from_mixed_endian(mixed), u);
}

#[test]
fn uuid_length_is_checked() {
    assert_eq!(
        validate_code(&CborValue::tagged(37, vec![0u8; 15])),
        ErrorCode::TagUuidLength
    );
    assert_eq!(
        Uuid::from_value(&CborValue::tagged(36, vec![0u8; 16]))
            .unwrap_err()
            .code,
        ErrorCode::TagPayloadType
    );
}

#[test]
fn date_time_parsing_and_epochs() {
    let t = DateTimeFields::parse("2013-03-21T20:04:00Z").unwrap();
    assert_eq!(t.year, BigInt::from(2013));
    assert_eq!((t.month, t.day, t.hour, t.minute, t.second), (3, 21, 20, 4, 0));
    assert_eq!(t.to_epoch_seconds(), CborNumber::Int64(1_363_896_240));

    let shifted = DateTimeFields::parse("2013-03-21T22:04:00+02:00").unwrap();
    assert_eq!(shifted.to_epoch_seconds(), CborNumber::Int64(1_363_896_240));
    assert_eq!(shifted.format().unwrap(), "2013-03-21T22:04:00+02:00");

    let frac = DateTimeFields::parse("2013-03-21T20:04:00.5Z").unwrap();
    assert_eq!(frac.nanosecond, 500_000_000);
    assert_eq!(
        frac.to_epoch_seconds().to_rational().unwrap(),
        CborNumber::Float64(1_363_896_240.5).to_rational().unwrap()
    );

    assert!(DateTimeFields::parse("2024-02-29T00:00:00Z").is_ok());
    for bad in [
        "2023-02-29T00:00:00Z",
        "2013-03-21 20:04:00Z",
        "2013-03-21T24:00:00Z",
        "2013-03-21T20:04:00",
        "2013-03-21T20:04:00.Z",
        "2013-03-21T20:04:00Zjunk",
    ] {
        assert_eq!(
            DateTimeFields::parse(bad).unwrap_err().code,
            ErrorCode::TagDateFormat,
            "{bad}"
        );
    }
}

#[test]
fn epoch_breakdown_and_formatting() {
    let t = DateTimeFields::from_epoch_seconds(&CborNumber::Int64(1_363_896_240)).unwrap();
    assert_eq!(t.format().unwrap(), "2013-03-21T20:04:00Z");

    let half = DateTimeFields::from_epoch_seconds(&CborNumber::Float64(1_363_896_240.5)).unwrap();
    assert_eq!(half.format().unwrap(), "2013-03-21T20:04:00.5Z");

    let before = DateTimeFields::from_epoch_seconds(&CborNumber::Int64(-1)).unwrap();
    assert_eq!(before.format().unwrap(), "1969-12-31T23:59:59Z");

    let far = DateTimeFields::from_epoch_seconds(&CborNumber::Int64(253_402_300_800)).unwrap();
    assert_eq!(far.year, BigInt::from(10_000));
    assert_eq!(far.format().unwrap_err().code, ErrorCode::TagDateFormat);

    assert_eq!(
        DateTimeFields::from_epoch_seconds(&CborNumber::Float64(f64::INFINITY))
            .unwrap_err()
            .code,
        ErrorCode::TagPayloadType
    );

    let epoch = DateTimeFields::from_value(&CborValue::tagged(1, 0)).unwrap();
    assert_eq!(
        epoch.to_value().unwrap(),
        CborValue::tagged(0, "1970-01-01T00:00:00Z")
    );
}

#[test]
fn object_type_tags() {
    let ok = CborValue::tagged(26, pair("Point", 1));
    assert_eq!(validate(&ok).unwrap(), ok);
    assert_eq!(
        validate_code(&CborValue::tagged(26, arr(vec![]))),
        ErrorCode::TagPayloadType
    );
    assert_eq!(
        validate_code(&CborValue::tagged(27, "Point")),
        ErrorCode::TagPayloadType
    );
}

#[test]
fn object_type_tags_only_check_the_array_shape() {
    let numeric_head = CborValue::tagged(27, pair(1, 2));
    assert_eq!(validate(&numeric_head).unwrap(), numeric_head);

    let single = CborValue::tagged(26, arr(vec![CborValue::Null]));
    assert_eq!(validate(&single).unwrap(), single);
}

#[test]
fn unknown_tags_pass_through() {
    let reg = TagRegistry::with_defaults();
    assert!(!reg.is_registered(999));
    assert!(reg.handler(999).type_filter().is_any());
    let v = CborValue::tagged(999, CborValue::Map(CborMap::new()));
    assert_eq!(reg.validate(&v).unwrap(), v);
    assert_eq!(reg.validate(&CborValue::from(1)).unwrap(), CborValue::from(1));

    let empty = TagRegistry::empty();
    assert!(!empty.is_registered(2));
    let raw = CborValue::tagged(2, "not bytes");
    assert_eq!(empty.validate(&raw).unwrap(), raw);
}

struct Shout;

impl TagHandler for Shout {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::text_string()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        let text = payload
            .as_text()
            .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
        Ok(CborValue::tagged(tag, text.to_uppercase()))
    }
}

#[test]
fn custom_handlers_replace_generic_behavior() {
    let mut reg = TagRegistry::with_defaults();
    reg.register(4000, Shout);
    assert!(reg.is_registered(4000));
    assert_eq!(
        reg.validate(&CborValue::tagged(4000, "hey")).unwrap(),
        CborValue::tagged(4000, "HEY")
    );
    assert_eq!(
        reg.validate(&CborValue::tagged(4000, 1)).unwrap_err().code,
        ErrorCode::TagPayloadType
    );
}

#[test]
fn deep_validation_normalizes_inner_tags() {
    let mut map = CborMap::new();
    map.insert("k", CborValue::tagged(30, pair(4, 2)));
    let value = arr(vec![
        CborValue::tagged(2, vec![0x01u8]),
        CborValue::Map(map),
        CborValue::tagged(1000, CborValue::tagged(3, vec![0x00u8])),
    ]);

    let mut expected_map = CborMap::new();
    expected_map.insert("k", 2);
    assert_eq!(
        TagRegistry::with_defaults().validate_deep(&value).unwrap(),
        arr(vec![
            CborValue::from(1),
            CborValue::Map(expected_map),
            CborValue::tagged(1000, -1),
        ])
    );

    let bad = arr(vec![CborValue::tagged(37, vec![0u8; 3])]);
    assert_eq!(
        TagRegistry::with_defaults().validate_deep(&bad).unwrap_err().code,
        ErrorCode::TagUuidLength
    );
}

#[test]
fn filter_basics() {
    let int = TypeFilter::integer();
    assert!(int.accepts(&CborValue::from(5)));
    assert!(int.accepts(&CborValue::from(-5)));
    assert!(!int.accepts(&CborValue::from("x")));
    assert!(!int.accepts(&CborValue::Float(1.0)));
    assert!(!int.accepts(&CborValue::from(BigInt::from(1u8) << 64u32)));
    assert!(int
        .with_tags(&[2, 3])
        .accepts(&CborValue::from(BigInt::from(1u8) << 64u32)));

    let fp = TypeFilter::none().with_floating_point();
    assert!(fp.accepts(&CborValue::Float(1.0)));
    assert!(!fp.accepts(&CborValue::Bool(true)));
    assert!(!fp.non_fp_simple_value_allowed());

    let nothing = TypeFilter::none();
    for v in [
        CborValue::from(0),
        CborValue::from("a"),
        CborValue::Null,
        CborValue::Array(vec![]),
        CborValue::tagged(1, 0),
    ] {
        assert!(!nothing.accepts(&v));
        assert!(TypeFilter::any().accepts(&v));
    }
}

#[test]
fn string_filters_admit_string_references() {
    assert!(TypeFilter::byte_string().tag_allowed(25));
    assert!(TypeFilter::text_string().accepts(&CborValue::tagged(25, 0)));
    assert!(!TypeFilter::integer().accepts(&CborValue::tagged(25, 0)));
}

#[test]
fn builders_only_widen() {
    let samples = [
        CborValue::from(1),
        CborValue::from(-1),
        CborValue::from("t"),
        CborValue::Bytes(vec![1]),
        CborValue::Float(0.5),
        CborValue::Map(CborMap::new()),
        CborValue::Array(vec![CborValue::from(1)]),
        CborValue::tagged(7, 0),
    ];
    let chain = [
        TypeFilter::none(),
        TypeFilter::none().with_unsigned_integer(),
        TypeFilter::none().with_unsigned_integer().with_text_string(),
        TypeFilter::none()
            .with_unsigned_integer()
            .with_text_string()
            .with_floating_point(),
        TypeFilter::none()
            .with_unsigned_integer()
            .with_text_string()
            .with_floating_point()
            .with_map()
            .with_tags(&[7]),
    ];
    for step in chain.windows(2) {
        for v in &samples {
            if step[0].accepts(v) {
                assert!(step[1].accepts(v), "{v:?}");
            }
        }
    }
    assert!(TypeFilter::any().with_array_exact_length(1, &[]).is_any());
    assert!(TypeFilter::any().with_tags(&[1]).is_any());
}

#[test]
fn array_shapes_and_element_filters() {
    let f = TypeFilter::none()
        .with_array_exact_length(2, &[TypeFilter::integer(), TypeFilter::text_string()]);
    assert_eq!(f.sub_filter(0), &TypeFilter::integer());
    assert_eq!(f.sub_filter(1), &TypeFilter::text_string());
    assert_eq!(f.sub_filter(2), &TypeFilter::none());
    assert!(f.array_length_matches(2));
    assert!(!f.array_length_matches(3));
    assert!(f.array_index_allowed(1));
    assert!(!f.array_index_allowed(2));
    assert!(f.accepts(&pair(1, "a")));
    assert!(!f.accepts(&pair("a", 1)));
    assert!(!f.accepts(&arr(vec![
        CborValue::from(1),
        CborValue::from("a"),
        CborValue::from(2)
    ])));

    let truncated = TypeFilter::none()
        .with_array_exact_length(1, &[TypeFilter::integer(), TypeFilter::text_string()]);
    assert_eq!(truncated.sub_filter(1), &TypeFilter::none());

    let at_least = TypeFilter::none().with_array_min_length(2, &[TypeFilter::text_string()]);
    assert_eq!(at_least.sub_filter(5), &TypeFilter::text_string());
    assert!(!at_least.accepts(&arr(vec![CborValue::from("a")])));
    assert!(at_least.accepts(&arr(vec![
        CborValue::from("a"),
        CborValue::from("b"),
        CborValue::from("c")
    ])));

    let open = TypeFilter::none().with_array_min_length(1, &[]);
    assert!(open.sub_filter(3).is_any());

    let any_len = TypeFilter::none().with_array_any_length();
    assert!(any_len.sub_filter(0).is_any());
    assert!(any_len.accepts(&arr(vec![CborValue::Null; 10])));
}
