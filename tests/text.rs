#![allow(clippy::unwrap_used, clippy::expect_used)]

use cbor_canon::text::base::{to_base16, to_base64, to_base64url};
use cbor_canon::text::utf8::{decode_replace, decode_strict, from_utf16, utf16_encoded_len};
use cbor_canon::text::ByteEncoding;
use cbor_canon::ErrorCode;

#[test]
fn byte_encodings() {
    let bytes = [0xfb, 0xff];
    assert_eq!(to_base64(&bytes, true), "+/8=");
    assert_eq!(to_base64(&bytes, false), "+/8");
    assert_eq!(to_base64url(&bytes, true), "-_8=");
    assert_eq!(to_base64url(&bytes, false), "-_8");
    assert_eq!(to_base16(&bytes), "fbff");
    assert_eq!(to_base64(&[], true), "");

    assert_eq!(ByteEncoding::for_tag(21), Some(ByteEncoding::Base64Url));
    assert_eq!(ByteEncoding::for_tag(22), Some(ByteEncoding::Base64));
    assert_eq!(ByteEncoding::for_tag(23), Some(ByteEncoding::Base16));
    assert_eq!(ByteEncoding::for_tag(24), None);
    assert_eq!(ByteEncoding::default(), ByteEncoding::Base64Url);
}

#[test]
fn byte_encoding_windows_are_checked() {
    let bytes = [0x00, 0xfb, 0xff, 0x00];
    assert_eq!(
        ByteEncoding::Base16.encode_range(&bytes, 1, 2, false).unwrap(),
        "fbff"
    );
    assert_eq!(
        ByteEncoding::Base64
            .encode_range(&bytes, 3, 2, true)
            .unwrap_err()
            .code,
        ErrorCode::ArgumentOutOfRange
    );
    assert_eq!(
        ByteEncoding::Base64
            .encode_range(&bytes, 5, 0, true)
            .unwrap_err()
            .code,
        ErrorCode::ArgumentOutOfRange
    );
}

#[test]
fn utf8_strict_and_replacing() {
    assert_eq!(decode_strict("héllo".as_bytes()).unwrap(), "héllo");
    assert_eq!(
        decode_strict(&[0x61, 0xff, 0x62]).unwrap_err().code,
        ErrorCode::Utf8Invalid
    );
    assert_eq!(decode_replace(&[0x61, 0xff, 0x62]), "a\u{fffd}b");
    assert_eq!(decode_replace(&[0xe2, 0x82]), "\u{fffd}");
}

#[test]
fn utf16_conversion() {
    let smile = [0x0048, 0xd83d, 0xde00];
    assert_eq!(from_utf16(&smile, false).unwrap(), "H\u{1f600}");
    assert_eq!(utf16_encoded_len(&smile, false).unwrap(), 5);

    let unpaired = [0x0041, 0xd800, 0x0042];
    let err = from_utf16(&unpaired, false).unwrap_err();
    assert_eq!(err.code, ErrorCode::Utf16Invalid);
    assert_eq!(err.offset, 1);
    assert_eq!(
        utf16_encoded_len(&unpaired, false).unwrap_err().code,
        ErrorCode::Utf16Invalid
    );

    assert_eq!(from_utf16(&unpaired, true).unwrap(), "A\u{fffd}B");
    assert_eq!(utf16_encoded_len(&unpaired, true).unwrap(), 5);
}
