#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Cursor;

use cbor_canon::json::{
    format_f64, from_json_bytes, from_json_reader, from_json_str, parse_json_number,
    parse_json_number_range, to_json_string, write_json,
};
use cbor_canon::text::{CharacterInput, CharacterReader, TextEncoding};
use cbor_canon::{
    BigDecimal, BigInt, CborError, CborMap, CborNumber, CborValue, ErrorCode, JsonOptions,
    NumberConversion, JSON_MAX_DEPTH,
};

fn parse(s: &str) -> Result<CborValue, CborError> {
    from_json_str(s, &JsonOptions::default())
}

fn parse_err(s: &str) -> CborError {
    parse(s).unwrap_err()
}

fn num(s: &str) -> Option<CborNumber> {
    parse_json_number(s, &JsonOptions::default())
}

fn with_conversion(mode: NumberConversion) -> JsonOptions {
    JsonOptions {
        number_conversion: mode,
        ..JsonOptions::default()
    }
}

fn json(value: &CborValue) -> String {
    to_json_string(value, &JsonOptions::default()).unwrap()
}

fn is_negative_zero(v: &CborValue) -> bool {
    matches!(v, CborValue::Float(f) if *f == 0.0 && f.is_sign_negative())
}

#[test]
fn documents_parse_into_values() {
    let v = parse(r#" {"a": [1, true, null, "x"], "b": {"c": false}} "#).unwrap();
    let map = v.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.get_text("a").unwrap(),
        &CborValue::Array(vec![
            CborValue::from(1),
            CborValue::Bool(true),
            CborValue::Null,
            CborValue::from("x"),
        ])
    );
    let keys: Vec<_> = map.keys().map(|k| k.as_text().unwrap()).collect();
    assert_eq!(keys, ["a", "b"]);

    assert_eq!(parse("[]").unwrap(), CborValue::Array(vec![]));
    assert_eq!(parse("{}").unwrap(), CborValue::Map(CborMap::new()));
    assert_eq!(parse("\"\"").unwrap(), CborValue::from(""));
}

#[test]
fn number_grammar() {
    for bad in ["01", "-", "1.", ".5", "1e", "1e+", "-01", "1.5.2", "0x10", "1-2"] {
        assert!(num(bad).is_none(), "{bad}");
    }
    assert_eq!(num("0"), Some(CborNumber::Int64(0)));
    assert_eq!(num("-12"), Some(CborNumber::Int64(-12)));
    assert_eq!(
        num("99999999999999999999"),
        Some(CborNumber::BigInteger("99999999999999999999".parse().unwrap()))
    );
    assert_eq!(
        num("1.5"),
        Some(CborNumber::Decimal(BigDecimal::new(BigInt::from(15), -1)))
    );
    assert_eq!(num("1.5e+3").unwrap().to_string(), "1.5E+3");
    assert_eq!(num("25E-2").unwrap().to_string(), "0.25");

    assert_eq!(parse_err("01").code, ErrorCode::JsonInvalidNumber);
    assert_eq!(parse_err("+1").code, ErrorCode::JsonSyntax);
}

#[test]
fn long_digit_runs_are_exact() {
    let digits: String = "1234567890".repeat(2_000);
    for len in [10, 18, 19, 27, 28, 100, 1_001, 20_000] {
        let text = &digits[..len];
        assert_eq!(
            num(text),
            Some(CborNumber::from_bigint(text.parse().unwrap())),
            "{len}"
        );
    }

    let (int_part, frac_part) = (&digits[..13], &digits[..25]);
    let expected: BigInt = format!("-{int_part}{frac_part}").parse().unwrap();
    assert_eq!(
        num(&format!("-{int_part}.{frac_part}")),
        Some(CborNumber::Decimal(BigDecimal::new(expected, -25)))
    );

    let big_exponent = num(&format!("1e{}", &digits[..21])).unwrap();
    let expected_exp: BigInt = digits[..21].parse().unwrap();
    assert_eq!(
        big_exponent,
        CborNumber::Decimal(BigDecimal::new(BigInt::from(1), expected_exp))
    );
}

#[test]
fn negative_zero() {
    assert_eq!(num("-0"), Some(CborNumber::Int64(0)));
    assert_eq!(parse("-0").unwrap(), CborValue::from(0));

    let keep = JsonOptions {
        preserve_negative_zero: true,
        ..JsonOptions::default()
    };
    let n = parse_json_number("-0", &keep).unwrap();
    assert!(n.is_zero() && n.is_negative());
    assert!(is_negative_zero(&from_json_str("-0.0", &keep).unwrap()));
    assert!(is_negative_zero(
        &from_json_str(
            "-0",
            &JsonOptions {
                number_conversion: NumberConversion::IntOrFloat,
                ..keep
            }
        )
        .unwrap()
    ));
}

#[test]
fn conversion_modes() {
    let double = with_conversion(NumberConversion::Double);
    assert_eq!(
        parse_json_number("1", &double),
        Some(CborNumber::Float64(1.0))
    );
    assert_eq!(from_json_str("[1]", &double).unwrap(), CborValue::Array(vec![CborValue::Float(1.0)]));

    let int_or_float = with_conversion(NumberConversion::IntOrFloat);
    let conv = |s: &str| parse_json_number(s, &int_or_float).unwrap();
    assert_eq!(conv("3.0"), CborNumber::Int64(3));
    assert_eq!(conv("1e2"), CborNumber::Int64(100));
    assert_eq!(conv("2.5"), CborNumber::Float64(2.5));
    assert_eq!(conv("99999999999999999999"), CborNumber::Float64(1e20));

    let full = parse("[1.5, 10]").unwrap();
    assert_eq!(
        full,
        CborValue::Array(vec![
            CborValue::tagged(4, vec![CborValue::from(-1), CborValue::from(15)]),
            CborValue::from(10),
        ])
    );
}

#[test]
fn number_ranges() {
    let opts = JsonOptions::default();
    assert_eq!(
        parse_json_number_range("[12.5]", 1, 4, &opts).unwrap(),
        Some(CborNumber::Decimal(BigDecimal::new(BigInt::from(125), -1)))
    );
    assert_eq!(parse_json_number_range("[12.5]", 0, 3, &opts).unwrap(), None);
    assert_eq!(
        parse_json_number_range("[12.5]", 5, 4, &opts).unwrap_err().code,
        ErrorCode::ArgumentOutOfRange
    );
    assert_eq!(
        parse_json_number_range("\u{e9}1", 1, 2, &opts).unwrap_err().code,
        ErrorCode::ArgumentOutOfRange
    );
}

#[test]
fn escapes_and_surrogates() {
    assert_eq!(
        parse(r#""a\"b\\c\/d\b\f\n\r\té""#).unwrap(),
        CborValue::from("a\"b\\c/d\u{8}\u{c}\n\r\t\u{e9}")
    );
    assert_eq!(
        parse(r#""\ud83d\ude00""#).unwrap(),
        CborValue::from("\u{1f600}")
    );
    assert_eq!(parse_err(r#""\x""#).code, ErrorCode::JsonInvalidEscape);
    assert_eq!(parse_err(r#""\u12g4""#).code, ErrorCode::JsonInvalidEscape);

    for lone in [r#""\ud83d""#, r#""\ud83d\u0041""#, r#""\ude00x""#, r#""\ud83dA""#, r#""\ud83dz""#] {
        assert_eq!(parse_err(lone).code, ErrorCode::JsonUnpairedSurrogate, "{lone}");
    }

    let replace = JsonOptions {
        replace_surrogates: true,
        ..JsonOptions::default()
    };
    let r = |s: &str| from_json_str(s, &replace).unwrap();
    assert_eq!(r(r#""\ud83d""#), CborValue::from("\u{fffd}"));
    assert_eq!(r(r#""\ude00x""#), CborValue::from("\u{fffd}x"));
    assert_eq!(r(r#""\ud83dA""#), CborValue::from("\u{fffd}A"));
    assert_eq!(r(r#""\ud83d\n""#), CborValue::from("\u{fffd}\n"));
}

#[test]
fn structural_errors_carry_character_offsets() {
    let e = parse_err("[1,]");
    assert_eq!((e.code, e.offset), (ErrorCode::JsonTrailingComma, 4));
    assert_eq!(parse_err(r#"{"a":1,}"#).code, ErrorCode::JsonTrailingComma);

    let e = parse_err("\"a\u{1}\"");
    assert_eq!((e.code, e.offset), (ErrorCode::JsonControlCharacter, 3));

    let e = parse_err("1 2");
    assert_eq!((e.code, e.offset), (ErrorCode::JsonTrailingData, 3));
    assert_eq!(parse_err("{} x").code, ErrorCode::JsonTrailingData);

    for bad in ["", "[", "{\"a\"}", "{1:2}", "[1 2]", "tru", "nul", "\"open"] {
        assert_eq!(parse_err(bad).code, ErrorCode::JsonSyntax, "{bad:?}");
    }
}

#[test]
fn duplicate_keys() {
    let e = parse_err(r#"{"a":1,"a":2}"#);
    assert_eq!(e.code, ErrorCode::DuplicateMapKey);

    let allow = JsonOptions {
        allow_duplicate_keys: true,
        ..JsonOptions::default()
    };
    let v = from_json_str(r#"{"a":1,"b":0,"a":2}"#, &allow).unwrap();
    let map = v.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get_text("a"), Some(&CborValue::from(2)));
}

#[test]
fn nesting_limit() {
    let run = || {
        let ok = format!("{}{}", "[".repeat(JSON_MAX_DEPTH), "]".repeat(JSON_MAX_DEPTH));
        assert!(parse(&ok).is_ok());
        let deep = format!(
            "{}{}",
            "[".repeat(JSON_MAX_DEPTH + 1),
            "]".repeat(JSON_MAX_DEPTH + 1)
        );
        assert_eq!(parse_err(&deep).code, ErrorCode::JsonNestingTooDeep);
    };
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(run)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn writer_escapes_strings() {
    assert_eq!(
        json(&CborValue::from("q\"b\\n\n\u{1}\u{2028}\u{2029}\u{e9}")),
        r#""q\"b\\n\n\u0001\u2028\u2029é""#
    );
}

#[test]
fn writer_scalars() {
    let v = CborValue::Array(vec![
        CborValue::Bool(true),
        CborValue::Bool(false),
        CborValue::Null,
        CborValue::Undefined,
        CborValue::Simple(99),
        CborValue::from(-7),
        CborValue::from(BigInt::from(1u8) << 70u32),
        CborValue::Float(1.0),
        CborValue::Float(0.1),
        CborValue::Float(f64::NAN),
        CborValue::Float(f64::NEG_INFINITY),
        CborValue::tagged(4, vec![CborValue::from(-2), CborValue::from(27_315)]),
        CborValue::tagged(30, vec![CborValue::from(1), CborValue::from(4)]),
    ]);
    assert_eq!(
        json(&v),
        "[true,false,null,null,null,-7,1180591620717411303424,1,0.1,null,null,273.15,0.25]"
    );
}

#[test]
fn writer_byte_encodings() {
    let bytes = vec![0xfbu8, 0xff];
    assert_eq!(json(&CborValue::Bytes(bytes.clone())), r#""-_8""#);
    assert_eq!(json(&CborValue::tagged(21, bytes.clone())), r#""-_8""#);
    assert_eq!(json(&CborValue::tagged(22, bytes.clone())), r#""+/8""#);
    assert_eq!(json(&CborValue::tagged(23, bytes.clone())), r#""fbff""#);

    let padded = JsonOptions {
        base64_padding: true,
        ..JsonOptions::default()
    };
    assert_eq!(
        to_json_string(&CborValue::Bytes(bytes), &padded).unwrap(),
        r#""-_8=""#
    );
}

#[test]
fn writer_maps() {
    let mut text_keys = CborMap::new();
    text_keys.insert("z", 1);
    text_keys.insert("a", CborValue::Array(vec![]));
    assert_eq!(json(&CborValue::Map(text_keys)), r#"{"z":1,"a":[]}"#);

    let mut mixed = CborMap::new();
    mixed.insert(1, "a");
    mixed.insert(CborValue::Bytes(vec![1]), 2);
    mixed.insert(CborValue::Bool(true), 3);
    assert_eq!(
        json(&CborValue::Map(mixed)),
        r#"{"1":"a","AQ":2,"true":3}"#
    );

    let mut clash = CborMap::new();
    clash.insert(1, "a");
    clash.insert("1", "b");
    assert_eq!(
        to_json_string(&CborValue::Map(clash), &JsonOptions::default())
            .unwrap_err()
            .code,
        ErrorCode::DuplicateMapKey
    );
}

#[test]
fn write_json_to_a_writer() {
    let mut out = Vec::new();
    write_json(
        &CborValue::Array(vec![CborValue::from("x")]),
        &mut out,
        &JsonOptions::default(),
    )
    .unwrap();
    assert_eq!(out, br#"["x"]"#);
}

#[test]
fn format_f64_is_shortest() {
    assert_eq!(format_f64(1.0), "1");
    assert_eq!(format_f64(-2.5), "-2.5");
    assert_eq!(format_f64(1e300), "1e300");
    assert_eq!(format_f64(f64::NAN), "NaN");
    assert_eq!(format_f64(f64::INFINITY), "Infinity");
}

fn utf16(s: &str, big_endian: bool) -> Vec<u8> {
    s.encode_utf16()
        .flat_map(|u| if big_endian { u.to_be_bytes() } else { u.to_le_bytes() })
        .collect()
}

fn utf32(s: &str, big_endian: bool) -> Vec<u8> {
    s.chars()
        .flat_map(|c| {
            let u = u32::from(c);
            if big_endian {
                u.to_be_bytes()
            } else {
                u.to_le_bytes()
            }
        })
        .collect()
}

#[test]
fn byte_input_encodings_are_detected() {
    let doc = r#"["é", "é", 1]"#;
    let expected = parse(doc).unwrap();
    let opts = JsonOptions::default();

    let inputs = [
        doc.as_bytes().to_vec(),
        [&[0xef, 0xbb, 0xbf][..], doc.as_bytes()].concat(),
        utf16(doc, false),
        utf16(doc, true),
        [&[0xff, 0xfe][..], &utf16(doc, false)[..]].concat(),
        [&[0xfe, 0xff][..], &utf16(doc, true)[..]].concat(),
        utf32(doc, false),
        utf32(doc, true),
        [&[0xff, 0xfe, 0, 0][..], &utf32(doc, false)[..]].concat(),
        [&[0, 0, 0xfe, 0xff][..], &utf32(doc, true)[..]].concat(),
    ];
    for bytes in &inputs {
        assert_eq!(from_json_bytes(bytes, &opts).unwrap(), expected, "{bytes:02x?}");
    }
    assert_eq!(
        from_json_reader(Cursor::new(utf16(doc, true)), &opts).unwrap(),
        expected
    );
}

#[test]
fn character_reader_reports_its_encoding() {
    let bytes = utf16("ab", true);
    let mut reader = CharacterReader::new(bytes.as_slice(), false);
    assert_eq!(reader.encoding(), None);
    assert_eq!(reader.read_char().unwrap(), Some('a'));
    assert_eq!(reader.encoding(), Some(TextEncoding::Utf16Be));
    assert_eq!(reader.read_char().unwrap(), Some('b'));
    assert_eq!(reader.read_char().unwrap(), None);
    assert_eq!(reader.position(), 2);

    let single = utf16("7", false);
    assert_eq!(
        from_json_bytes(&single, &JsonOptions::default()).unwrap(),
        CborValue::from(7)
    );
}

#[test]
fn malformed_byte_input() {
    let opts = JsonOptions::default();
    assert_eq!(
        from_json_bytes(b"\"\xff\"", &opts).unwrap_err().code,
        ErrorCode::Utf8Invalid
    );
    let lone_high = [0x22, 0x00, 0x3d, 0xd8, 0x22, 0x00];
    assert_eq!(
        from_json_bytes(&lone_high, &opts).unwrap_err().code,
        ErrorCode::Utf16Invalid
    );

    let mut lenient = CharacterReader::new(&b"\xffa"[..], true);
    assert_eq!(lenient.read_char().unwrap(), Some('\u{fffd}'));
    assert_eq!(lenient.read_char().unwrap(), Some('a'));
}

#[test]
fn json_round_trip_through_values() {
    let doc = r#"{"name":"x","tags":[1,-2,3.25],"nested":{"ok":true,"none":null}}"#;
    let v = parse(doc).unwrap();
    assert_eq!(json(&v), doc);
}
