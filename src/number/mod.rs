//! One numeric contract over the seven representations a CBOR number can take.
//!
//! Every query is answered by the variant itself, using exact comparisons; nothing routes through
//! a lossy intermediate.

mod scaled;

use core::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};

pub use scaled::{BigDecimal, BigFloat, Scaled, MAX_EXACT_EXPONENT};
pub(crate) use scaled::{rational_to_f32, rational_to_f64};

use crate::{CborError, CborInteger, CborValue, ErrorCode};

/// Sign of a number, with NaN as its own case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Below zero.
    Negative,
    /// Zero of either sign.
    Zero,
    /// Above zero.
    Positive,
    /// Not a number.
    NaN,
}

impl Sign {
    /// `-1`, `0`, `1`, or `2` for NaN.
    #[inline]
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Negative => -1,
            Self::Zero => 0,
            Self::Positive => 1,
            Self::NaN => 2,
        }
    }
}

/// A CBOR number in one of seven representations.
#[derive(Debug, Clone, PartialEq)]
pub enum CborNumber {
    /// Machine integer.
    Int64(i64),
    /// Arbitrary-precision integer.
    BigInteger(BigInt),
    /// IEEE binary32.
    Float32(f32),
    /// IEEE binary64.
    Float64(f64),
    /// Arbitrary-precision decimal fraction.
    Decimal(BigDecimal),
    /// Arbitrary-precision binary fraction.
    BigFloat(BigFloat),
    /// Exact rational.
    Rational(BigRational),
}

#[inline]
fn overflow() -> CborError {
    CborError::at_start(ErrorCode::NumberOverflow)
}

#[inline]
fn lift(code: ErrorCode) -> CborError {
    CborError::at_start(code)
}

fn float_sign(f: f64) -> Sign {
    if f.is_nan() {
        Sign::NaN
    } else if f == 0.0 {
        Sign::Zero
    } else if f < 0.0 {
        Sign::Negative
    } else {
        Sign::Positive
    }
}

fn bigint_sign(b: &BigInt) -> Sign {
    if b.is_zero() {
        Sign::Zero
    } else if b.is_negative() {
        Sign::Negative
    } else {
        Sign::Positive
    }
}

fn scaled_sign<const R: u32>(s: &Scaled<R>) -> Sign {
    if s.is_nan() {
        Sign::NaN
    } else if s.is_zero() {
        Sign::Zero
    } else if s.is_negative() {
        Sign::Negative
    } else {
        Sign::Positive
    }
}

/// Truncate a float toward zero into `[min, max]`.
fn truncate_float(f: f64, min: i64, max: i64) -> Result<i64, CborError> {
    if f.is_nan() {
        return Err(lift(ErrorCode::NumberNaN));
    }
    let t = f.trunc();
    // Both bounds are exact in f64 except i64::MAX, which rounds up to 2^63.
    #[allow(clippy::cast_precision_loss)]
    let (lo, hi) = (min as f64, max as f64);
    if t < lo || t > hi || (max == i64::MAX && t >= 9_223_372_036_854_775_808.0) {
        return Err(overflow());
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(t as i64)
}

fn bigint_in_range(b: &BigInt, min: i64, max: i64) -> Result<i64, CborError> {
    b.to_i64()
        .filter(|v| (min..=max).contains(v))
        .ok_or_else(overflow)
}

impl CborNumber {
    /// Returns `true` iff the value is finite and has no fractional part.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        match self {
            Self::Int64(_) | Self::BigInteger(_) => true,
            Self::Float32(f) => f.is_finite() && f.trunc() == *f,
            Self::Float64(f) => f.is_finite() && f.trunc() == *f,
            Self::Decimal(d) => d.is_integral(),
            Self::BigFloat(b) => b.is_integral(),
            Self::Rational(r) => r.is_integer(),
        }
    }

    /// Returns `true` iff the value is zero of either sign.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.sign() == Sign::Zero
    }

    /// The sign, with NaN reported separately.
    #[must_use]
    pub fn sign(&self) -> Sign {
        match self {
            Self::Int64(v) => match v.signum() {
                -1 => Sign::Negative,
                0 => Sign::Zero,
                _ => Sign::Positive,
            },
            Self::BigInteger(b) => bigint_sign(b),
            Self::Float32(f) => float_sign(f64::from(*f)),
            Self::Float64(f) => float_sign(*f),
            Self::Decimal(d) => scaled_sign(d),
            Self::BigFloat(b) => scaled_sign(b),
            Self::Rational(r) => bigint_sign(r.numer()),
        }
    }

    /// Returns `true` iff the sign bit is set. Negative zero and negative infinity count; NaN does
    /// not.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Float32(f) => !f.is_nan() && f.is_sign_negative(),
            Self::Float64(f) => !f.is_nan() && f.is_sign_negative(),
            Self::Decimal(d) => d.is_negative(),
            Self::BigFloat(b) => b.is_negative(),
            _ => self.sign() == Sign::Negative,
        }
    }

    /// Returns `true` iff the value is NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.sign() == Sign::NaN
    }

    /// Returns `true` iff the value is an infinity of either sign.
    #[must_use]
    pub fn is_infinity(&self) -> bool {
        match self {
            Self::Float32(f) => f.is_infinite(),
            Self::Float64(f) => f.is_infinite(),
            Self::Decimal(d) => d.is_infinite(),
            Self::BigFloat(b) => b.is_infinite(),
            Self::Int64(_) | Self::BigInteger(_) | Self::Rational(_) => false,
        }
    }

    /// Returns `true` iff the value is positive infinity.
    #[must_use]
    pub fn is_positive_infinity(&self) -> bool {
        self.is_infinity() && !self.is_negative()
    }

    /// Returns `true` iff the value is negative infinity.
    #[must_use]
    pub fn is_negative_infinity(&self) -> bool {
        self.is_infinity() && self.is_negative()
    }

    /// Returns `true` iff the value is neither infinite nor NaN.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        !self.is_infinity() && !self.is_nan()
    }

    /// The nearest float64. Never fails: out-of-range values become infinities.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int64(v) => *v as f64,
            Self::BigInteger(b) => rational_to_f64(&BigRational::from_integer(b.clone())),
            Self::Float32(f) => f64::from(*f),
            Self::Float64(f) => *f,
            Self::Decimal(d) => d.to_f64(),
            Self::BigFloat(b) => b.to_f64(),
            Self::Rational(r) => rational_to_f64(r),
        }
    }

    /// The nearest float32, rounded once from the exact value.
    #[must_use]
    pub fn to_f32(&self) -> f32 {
        match self {
            Self::Int64(v) => rational_to_f32(&BigRational::from_integer(BigInt::from(*v))),
            Self::BigInteger(b) => rational_to_f32(&BigRational::from_integer(b.clone())),
            Self::Float32(f) => *f,
            Self::Float64(f) => {
                #[allow(clippy::cast_possible_truncation)]
                let single = *f as f32;
                single
            }
            Self::Decimal(d) => d.to_f32(),
            Self::BigFloat(b) => b.to_f32(),
            Self::Rational(r) => rational_to_f32(r),
        }
    }

    /// The nearest float64, failing where [`to_f64`](Self::to_f64) would lose the value.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for a finite value that rounds to an infinity.
    pub fn as_f64(&self) -> Result<f64, CborError> {
        if self.is_nan() {
            return Err(lift(ErrorCode::NumberNaN));
        }
        let f = self.to_f64();
        if f.is_infinite() && !self.is_infinity() {
            return Err(overflow());
        }
        Ok(f)
    }

    /// The nearest float32, failing where [`to_f32`](Self::to_f32) would lose the value.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for a finite value that rounds to an infinity.
    pub fn as_f32(&self) -> Result<f32, CborError> {
        if self.is_nan() {
            return Err(lift(ErrorCode::NumberNaN));
        }
        let f = self.to_f32();
        if f.is_infinite() && !self.is_infinity() {
            return Err(overflow());
        }
        Ok(f)
    }

    /// Truncate toward zero into `[min, max]`.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for infinities and values outside the range.
    pub fn to_i64_in_range(&self, min: i64, max: i64) -> Result<i64, CborError> {
        match self {
            Self::Int64(v) if (min..=max).contains(v) => Ok(*v),
            Self::Int64(_) => Err(overflow()),
            Self::BigInteger(b) => bigint_in_range(b, min, max),
            Self::Float32(f) => truncate_float(f64::from(*f), min, max),
            Self::Float64(f) => truncate_float(*f, min, max),
            Self::Decimal(d) => {
                bigint_in_range(&d.to_bigint_within(65).map_err(lift)?, min, max)
            }
            Self::BigFloat(b) => {
                bigint_in_range(&b.to_bigint_within(65).map_err(lift)?, min, max)
            }
            Self::Rational(r) => bigint_in_range(&r.to_integer(), min, max),
        }
    }

    /// Truncate toward zero into `i64`.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` outside the `i64` range.
    pub fn to_i64(&self) -> Result<i64, CborError> {
        self.to_i64_in_range(i64::MIN, i64::MAX)
    }

    /// Truncate toward zero into `[min, max]` as `i32`.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` outside the range.
    pub fn to_i32(&self, min: i32, max: i32) -> Result<i32, CborError> {
        let v = self.to_i64_in_range(i64::from(min), i64::from(max))?;
        i32::try_from(v).map_err(|_| overflow())
    }

    /// Returns `true` iff the value converts to float64 and back without loss.
    #[must_use]
    pub fn can_fit_in_f64(&self) -> bool {
        match self {
            Self::Int64(v) => {
                #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
                let back = (*v as f64) as i128;
                back == i128::from(*v)
            }
            Self::BigInteger(b) => {
                let f = self.to_f64();
                f.is_finite() && BigInt::from_f64(f).as_ref() == Some(b)
            }
            Self::Float32(_) | Self::Float64(_) => true,
            Self::Decimal(d) => scaled_fits(d, d.to_f64(), BigDecimal::from_f64),
            Self::BigFloat(b) => scaled_fits(b, b.to_f64(), BigFloat::from_f64),
            Self::Rational(r) => {
                let f = rational_to_f64(r);
                f.is_finite() && BigRational::from_float(f).as_ref() == Some(r)
            }
        }
    }

    /// Returns `true` iff the value converts to float32 and back without loss.
    #[must_use]
    pub fn can_fit_in_f32(&self) -> bool {
        match self {
            Self::Float32(_) => true,
            Self::Float64(f) => crate::float::f64_to_f32_exact(*f).is_some(),
            Self::Decimal(d) => scaled_fits(d, f64::from(d.to_f32()), BigDecimal::from_f64),
            Self::BigFloat(b) => scaled_fits(b, f64::from(b.to_f32()), BigFloat::from_f64),
            _ => {
                let single = self.to_f32();
                if !single.is_finite() {
                    return false;
                }
                let widened = f64::from(single);
                match self.to_rational() {
                    Ok(exact) => BigRational::from_float(widened).as_ref() == Some(&exact),
                    Err(_) => false,
                }
            }
        }
    }

    /// Returns `true` iff the value is integral and fits `i64`.
    #[must_use]
    pub fn can_fit_in_i64(&self) -> bool {
        self.is_integral() && self.to_i64().is_ok()
    }

    /// Returns `true` iff the value is integral and fits `i32`.
    #[must_use]
    pub fn can_fit_in_i32(&self) -> bool {
        self.is_integral() && self.to_i32(i32::MIN, i32::MAX).is_ok()
    }

    /// Returns `true` iff the value truncated toward zero fits `i64`.
    #[must_use]
    pub fn can_truncated_int_fit_in_i64(&self) -> bool {
        self.to_i64().is_ok()
    }

    /// Returns `true` iff the value truncated toward zero fits `i32`.
    #[must_use]
    pub fn can_truncated_int_fit_in_i32(&self) -> bool {
        self.to_i32(i32::MIN, i32::MAX).is_ok()
    }

    /// Flip the sign. `i64::MIN` promotes to a big integer.
    #[must_use]
    pub fn negate(&self) -> Self {
        match self {
            Self::Int64(v) => v
                .checked_neg()
                .map_or_else(|| Self::BigInteger(-BigInt::from(*v)), Self::Int64),
            Self::BigInteger(b) => Self::BigInteger(-b),
            Self::Float32(f) => Self::Float32(-f),
            Self::Float64(f) => Self::Float64(-f),
            Self::Decimal(d) => Self::Decimal(d.negate()),
            Self::BigFloat(b) => Self::BigFloat(b.negate()),
            Self::Rational(r) => Self::Rational(-r),
        }
    }

    /// Absolute value. `i64::MIN` promotes to a big integer.
    #[must_use]
    pub fn abs(&self) -> Self {
        match self {
            Self::Int64(v) => v
                .checked_abs()
                .map_or_else(|| Self::BigInteger(BigInt::from(*v).abs()), Self::Int64),
            Self::BigInteger(b) => Self::BigInteger(b.abs()),
            Self::Float32(f) => Self::Float32(f.abs()),
            Self::Float64(f) => Self::Float64(f.abs()),
            Self::Decimal(d) => Self::Decimal(d.abs()),
            Self::BigFloat(b) => Self::BigFloat(b.abs()),
            Self::Rational(r) => Self::Rational(r.abs()),
        }
    }

    /// The exact value as a decimal fraction.
    ///
    /// # Errors
    ///
    /// `InexactConversion` for rationals without a terminating decimal expansion,
    /// `NumberOverflow` for exponents beyond [`MAX_EXACT_EXPONENT`].
    pub fn to_decimal(&self) -> Result<BigDecimal, CborError> {
        match self {
            Self::Int64(v) => Ok(BigDecimal::from_bigint(BigInt::from(*v))),
            Self::BigInteger(b) => Ok(BigDecimal::from_bigint(b.clone())),
            Self::Float32(f) => Ok(BigDecimal::from_f64(f64::from(*f))),
            Self::Float64(f) => Ok(BigDecimal::from_f64(*f)),
            Self::Decimal(d) => Ok(d.clone()),
            Self::BigFloat(b) => b.to_decimal().map_err(lift),
            Self::Rational(r) => BigDecimal::from_rational(r).map_err(lift),
        }
    }

    /// The exact value as a binary fraction.
    ///
    /// # Errors
    ///
    /// `InexactConversion` for values without a terminating binary expansion (e.g. `0.1`).
    pub fn to_bigfloat(&self) -> Result<BigFloat, CborError> {
        match self {
            Self::Int64(v) => Ok(BigFloat::from_bigint(BigInt::from(*v))),
            Self::BigInteger(b) => Ok(BigFloat::from_bigint(b.clone())),
            Self::Float32(f) => Ok(BigFloat::from_f64(f64::from(*f))),
            Self::Float64(f) => Ok(BigFloat::from_f64(*f)),
            Self::Decimal(d) => d.to_binary().map_err(lift),
            Self::BigFloat(b) => Ok(b.clone()),
            Self::Rational(r) => BigFloat::from_rational(r).map_err(lift),
        }
    }

    /// The exact value as a rational.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for infinities and huge exponents.
    pub fn to_rational(&self) -> Result<BigRational, CborError> {
        let from_float = |f: f64| {
            if f.is_nan() {
                Err(lift(ErrorCode::NumberNaN))
            } else {
                BigRational::from_float(f).ok_or_else(overflow)
            }
        };
        match self {
            Self::Int64(v) => Ok(BigRational::from_integer(BigInt::from(*v))),
            Self::BigInteger(b) => Ok(BigRational::from_integer(b.clone())),
            Self::Float32(f) => from_float(f64::from(*f)),
            Self::Float64(f) => from_float(*f),
            Self::Decimal(d) => d.to_rational().map_err(lift),
            Self::BigFloat(b) => b.to_rational().map_err(lift),
            Self::Rational(r) => Ok(r.clone()),
        }
    }

    /// The value truncated toward zero as an arbitrary-precision integer.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for infinities and huge exponents.
    pub fn to_bigint(&self) -> Result<BigInt, CborError> {
        match self {
            Self::Int64(v) => Ok(BigInt::from(*v)),
            Self::BigInteger(b) => Ok(b.clone()),
            Self::Float32(_) | Self::Float64(_) => {
                let f = self.to_f64();
                if f.is_nan() {
                    return Err(lift(ErrorCode::NumberNaN));
                }
                BigInt::from_f64(f.trunc()).ok_or_else(overflow)
            }
            Self::Decimal(d) => d.to_bigint().map_err(lift),
            Self::BigFloat(b) => b.to_bigint().map_err(lift),
            Self::Rational(r) => Ok(r.to_integer()),
        }
    }

    /// Interpret a CBOR value as a number: integers, floats, and tags 2, 3, 4, 5, 30, 264, 265.
    ///
    /// Returns `None` for anything else, including malformed numeric tags.
    #[must_use]
    pub fn from_value(value: &CborValue) -> Option<Self> {
        match value {
            CborValue::Integer(i) => Some(Self::from_integer(i)),
            CborValue::Float(f) => Some(Self::Float64(*f)),
            CborValue::Tag(2 | 3, _) => match crate::tags::bignum::decode(value) {
                Ok(CborValue::Integer(i)) => Some(Self::from_integer(&i)),
                _ => None,
            },
            CborValue::Tag(4 | 264, payload) => {
                crate::tags::fraction::decimal_from_payload(payload, true)
                    .ok()
                    .map(Self::Decimal)
            }
            CborValue::Tag(5 | 265, payload) => {
                crate::tags::fraction::bigfloat_from_payload(payload, true)
                    .ok()
                    .map(Self::BigFloat)
            }
            CborValue::Tag(30, payload) => crate::tags::rational::rational_from_payload(payload)
                .ok()
                .map(|r| {
                    if r.denom().is_one() {
                        Self::from_bigint(r.numer().clone())
                    } else {
                        Self::Rational(r)
                    }
                }),
            _ => None,
        }
    }

    fn from_integer(i: &CborInteger) -> Self {
        i.as_i64()
            .map_or_else(|| Self::BigInteger(i.to_bigint()), Self::Int64)
    }

    /// Wrap an arbitrary-precision integer, preferring the machine form when it fits.
    #[must_use]
    pub fn from_bigint(value: BigInt) -> Self {
        value.to_i64().map_or(Self::BigInteger(value), Self::Int64)
    }

    /// The CBOR form of this number.
    ///
    /// Decimals and bigfloats with exponent zero become plain integers; non-finite ones and
    /// negative zeros become floats. Exponents that do not fit `i64` use tags 264/265.
    #[must_use]
    pub fn to_value(&self) -> CborValue {
        match self {
            Self::Int64(v) => CborValue::from(*v),
            Self::BigInteger(b) => CborValue::from(b.clone()),
            Self::Float32(f) => CborValue::Float(f64::from(*f)),
            Self::Float64(f) => CborValue::Float(*f),
            Self::Decimal(d) => scaled_to_value(d, 4, 264),
            Self::BigFloat(b) => scaled_to_value(b, 5, 265),
            Self::Rational(r) => {
                if r.denom().is_one() {
                    CborValue::from(r.numer().clone())
                } else {
                    CborValue::tagged(
                        30,
                        vec![
                            CborValue::from(r.numer().clone()),
                            CborValue::from(r.denom().clone()),
                        ],
                    )
                }
            }
        }
    }
}

fn scaled_fits<const R: u32>(value: &Scaled<R>, f: f64, back: fn(f64) -> Scaled<R>) -> bool {
    if !value.is_finite() {
        return true;
    }
    if !f.is_finite() {
        return false;
    }
    if value.is_zero() {
        return f == 0.0 && f.is_sign_negative() == value.is_negative();
    }
    value.numeric_cmp(&back(f)) == Some(core::cmp::Ordering::Equal)
}

fn scaled_to_value<const R: u32>(value: &Scaled<R>, tag: u64, extended_tag: u64) -> CborValue {
    if !value.is_finite() || (value.is_zero() && value.is_negative()) {
        return CborValue::Float(value.to_f64());
    }
    if value.exponent().is_zero() {
        return CborValue::from(value.mantissa());
    }
    let tag = if value.exponent().to_i64().is_some() {
        tag
    } else {
        extended_tag
    };
    CborValue::tagged(
        tag,
        vec![
            CborValue::from(value.exponent().clone()),
            CborValue::from(value.mantissa()),
        ],
    )
}

impl fmt::Display for CborNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::BigInteger(b) => write!(f, "{b}"),
            Self::Float32(v) => f.write_str(&crate::json::format_f64(f64::from(*v))),
            Self::Float64(v) => f.write_str(&crate::json::format_f64(*v)),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::BigFloat(b) => write!(f, "{b}"),
            Self::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
        }
    }
}

impl From<i64> for CborNumber {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for CborNumber {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<BigDecimal> for CborNumber {
    fn from(value: BigDecimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<BigRational> for CborNumber {
    fn from(value: BigRational) -> Self {
        Self::Rational(value)
    }
}
