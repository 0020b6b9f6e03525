//! Tags 4/5 (decimal fraction, bigfloat) and their extended forms 264/265.
//!
//! The payload is `[exponent, mantissa]`. The plain forms bound the exponent to 64 bits; the
//! extended forms accept bignum exponents.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::number::{BigDecimal, BigFloat};
use crate::tags::bignum::integer_operand;
use crate::{CborError, CborInteger, CborValue, ErrorCode};

fn parts(payload: &CborValue, extended: bool) -> Result<(BigInt, BigInt), CborError> {
    let CborValue::Array(items) = payload else {
        return Err(CborError::at_start(ErrorCode::TagPayloadType));
    };
    let [exponent, mantissa] = items.as_slice() else {
        return Err(CborError::at_start(ErrorCode::TagArrayLength));
    };
    let exponent = integer_operand(exponent)?;
    let mantissa = integer_operand(mantissa)?;
    if !extended && CborInteger::from_bigint(exponent.clone()).to_wire().is_none() {
        return Err(CborError::at_start(ErrorCode::TagExponentTooLarge));
    }
    Ok((exponent, mantissa))
}

/// Decode a tag 4 (or 264 when `extended`) payload.
///
/// # Errors
///
/// `TagPayloadType`, `TagArrayLength` or `TagNonIntegral` for a malformed payload,
/// `TagExponentTooLarge` for a bignum exponent in the plain form.
pub fn decimal_from_payload(payload: &CborValue, extended: bool) -> Result<BigDecimal, CborError> {
    let (exponent, mantissa) = parts(payload, extended)?;
    Ok(BigDecimal::new(mantissa, exponent))
}

/// Decode a tag 5 (or 265 when `extended`) payload.
///
/// # Errors
///
/// As for [`decimal_from_payload`].
pub fn bigfloat_from_payload(payload: &CborValue, extended: bool) -> Result<BigFloat, CborError> {
    let (exponent, mantissa) = parts(payload, extended)?;
    Ok(BigFloat::new(mantissa, exponent))
}

/// Normalize a fraction: exponent zero collapses to the mantissa; bignum operands become
/// integers.
pub(crate) fn normalize(tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
    let (exponent, mantissa) = parts(payload, tag >= 264)?;
    if exponent.is_zero() {
        return Ok(CborValue::from(mantissa));
    }
    Ok(CborValue::tagged(
        tag,
        vec![CborValue::from(exponent), CborValue::from(mantissa)],
    ))
}
