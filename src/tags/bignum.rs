//! Tags 2 and 3: big-endian bignums.
//!
//! A tag 3 payload `n` denotes `-1 - n`, so the byte string `0x01` is `-2`.

use num_bigint::BigInt;

use crate::value::bigint_from_be;
use crate::{CborError, CborInteger, CborValue, ErrorCode};

/// Payloads up to this many bytes are accumulated in a machine integer.
const FAST_PATH_BYTES: usize = 7;

/// Decode a bignum magnitude; `negative` selects tag 3 semantics.
#[must_use]
pub fn integer_from_bytes(negative: bool, bytes: &[u8]) -> CborInteger {
    if bytes.len() <= FAST_PATH_BYTES {
        let raw = bytes
            .iter()
            .fold(0i64, |acc, b| (acc << 8) | i64::from(*b));
        return CborInteger::from(if negative { -1 - raw } else { raw });
    }
    let magnitude = bigint_from_be(bytes);
    if negative {
        CborInteger::from_bigint(-magnitude - 1u32)
    } else {
        CborInteger::from_bigint(magnitude)
    }
}

/// Convert `Tag(2 | 3, Bytes)` into an integer value.
///
/// # Errors
///
/// `TagPayloadType` if the value is not a tag 2/3 byte string.
pub fn decode(value: &CborValue) -> Result<CborValue, CborError> {
    match value {
        CborValue::Tag(tag @ (2 | 3), payload) => match payload.as_ref() {
            CborValue::Bytes(bytes) => Ok(CborValue::Integer(integer_from_bytes(*tag == 3, bytes))),
            _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
        },
        _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
    }
}

/// The tag 2/3 form of an integer.
#[must_use]
pub fn encode(value: &CborInteger) -> CborValue {
    let (negative, bytes) = value.to_bignum_parts();
    CborValue::tagged(if negative { 3 } else { 2 }, bytes)
}

/// Read an integer operand of a numeric tag: a plain integer or a tag 2/3 bignum.
pub(crate) fn integer_operand(value: &CborValue) -> Result<BigInt, CborError> {
    match value {
        CborValue::Integer(i) => Ok(i.to_bigint()),
        CborValue::Tag(2 | 3, _) => match decode(value)? {
            CborValue::Integer(i) => Ok(i.to_bigint()),
            _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
        },
        CborValue::Float(_) => Err(CborError::at_start(ErrorCode::TagNonIntegral)),
        _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
    }
}
