//! Tag 30: rational numbers as `[numerator, denominator]`.

use num_rational::BigRational;
use num_traits::{One, Signed};

use crate::tags::bignum::integer_operand;
use crate::{CborError, CborValue, ErrorCode};

/// Decode a tag 30 payload into a reduced rational.
///
/// # Errors
///
/// `TagPayloadType`/`TagArrayLength`/`TagNonIntegral` for a malformed payload, `TagDenominator`
/// when the denominator is not positive.
pub fn rational_from_payload(payload: &CborValue) -> Result<BigRational, CborError> {
    let CborValue::Array(items) = payload else {
        return Err(CborError::at_start(ErrorCode::TagPayloadType));
    };
    let [numer, denom] = items.as_slice() else {
        return Err(CborError::at_start(ErrorCode::TagArrayLength));
    };
    let numer = integer_operand(numer)?;
    let denom = integer_operand(denom)?;
    if !denom.is_positive() {
        return Err(CborError::at_start(ErrorCode::TagDenominator));
    }
    Ok(BigRational::new(numer, denom))
}

/// Normalize a tag 30 value; a denominator of one collapses to a plain integer.
pub(crate) fn normalize(payload: &CborValue) -> Result<CborValue, CborError> {
    let r = rational_from_payload(payload)?;
    if r.denom().is_one() {
        return Ok(CborValue::from(r.numer().clone()));
    }
    Ok(CborValue::tagged(
        30,
        vec![
            CborValue::from(r.numer().clone()),
            CborValue::from(r.denom().clone()),
        ],
    ))
}
