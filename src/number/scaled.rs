//! Arbitrary-precision scaled numbers: `mantissa * RADIX^exponent`.
//!
//! [`BigDecimal`] (radix 10) and [`BigFloat`] (radix 2) share one implementation. The exponent is
//! an unbounded `BigInt`, so values such as `1e999999999999` are representable; operations that
//! would have to expand the exponent into digits are bounded by [`MAX_EXACT_EXPONENT`].

use core::cmp::Ordering;
use core::fmt;

use num_bigint::{BigInt, BigUint, Sign as BigSign};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::ErrorCode;

/// Largest exponent magnitude that is expanded into an exact integer or rational.
///
/// A larger negative exponent is still expanded when `RADIX^-exponent` is at most 2048 bits
/// longer than the mantissa, so the expansion stays proportional to the input.
pub const MAX_EXACT_EXPONENT: u64 = 100_000;

/// Bits a divisor `RADIX^k` may exceed the mantissa by and still be expanded.
const DIVISOR_SLACK_BITS: u64 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Special {
    Finite,
    Infinity,
    NaN,
}

/// `(-1)^negative * mantissa * RADIX^exponent`, or an infinity, or NaN.
///
/// Equality is representational: `1.0` (`10 * 10^-1`) and `1` are different values. Use
/// [`Scaled::numeric_cmp`] to compare magnitudes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scaled<const RADIX: u32> {
    special: Special,
    negative: bool,
    mantissa: BigUint,
    exponent: BigInt,
}

/// Arbitrary-precision decimal floating point number.
pub type BigDecimal = Scaled<10>;
/// Arbitrary-precision binary floating point number.
pub type BigFloat = Scaled<2>;

impl<const RADIX: u32> Scaled<RADIX> {
    const RADIX_CHECK: () = assert!(RADIX == 2 || RADIX == 10, "radix must be 2 or 10");

    /// Construct a finite value from a signed mantissa and an exponent.
    #[must_use]
    pub fn new(mantissa: BigInt, exponent: impl Into<BigInt>) -> Self {
        let (sign, magnitude) = mantissa.into_parts();
        Self::from_parts(sign == BigSign::Minus, magnitude, exponent.into())
    }

    /// Construct a finite value from sign, magnitude and exponent. A negative zero is allowed.
    #[must_use]
    pub fn from_parts(negative: bool, mantissa: BigUint, exponent: BigInt) -> Self {
        let () = Self::RADIX_CHECK;
        Self {
            special: Special::Finite,
            negative,
            mantissa,
            exponent,
        }
    }

    /// An integer value with exponent zero.
    #[must_use]
    pub fn from_bigint(value: BigInt) -> Self {
        Self::new(value, 0)
    }

    /// Positive or negative zero.
    #[must_use]
    pub fn zero(negative: bool) -> Self {
        Self::from_parts(negative, BigUint::zero(), BigInt::zero())
    }

    /// Positive or negative infinity.
    #[must_use]
    pub fn infinity(negative: bool) -> Self {
        let () = Self::RADIX_CHECK;
        Self {
            special: Special::Infinity,
            negative,
            mantissa: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    /// Not-a-number.
    #[must_use]
    pub fn nan() -> Self {
        let () = Self::RADIX_CHECK;
        Self {
            special: Special::NaN,
            negative: false,
            mantissa: BigUint::zero(),
            exponent: BigInt::zero(),
        }
    }

    /// Exact value of a float64, including signed zero, infinities and NaN.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::nan();
        }
        let negative = value.is_sign_negative();
        if value.is_infinite() {
            return Self::infinity(negative);
        }
        let bits = value.to_bits();
        let raw_exp = i64::try_from((bits >> 52) & 0x7ff).unwrap_or(0);
        let frac = bits & 0x000f_ffff_ffff_ffff;
        let (mut m, mut e) = if raw_exp == 0 {
            (frac, -1074)
        } else {
            (frac | (1 << 52), raw_exp - 1075)
        };
        if m == 0 {
            return Self::zero(negative);
        }
        let tz = m.trailing_zeros();
        m >>= tz;
        e += i64::from(tz);
        Self::from_binary(negative, BigUint::from(m), e)
    }

    fn from_binary(negative: bool, m: BigUint, e: i64) -> Self {
        if RADIX == 2 {
            return Self::from_parts(negative, m, BigInt::from(e));
        }
        if e >= 0 {
            Self::from_parts(negative, m << e.unsigned_abs(), BigInt::zero())
        } else {
            let k = e.unsigned_abs();
            let five = BigUint::from(5u32).pow(u32::try_from(k).unwrap_or(u32::MAX));
            Self::from_parts(negative, m * five, BigInt::from(e))
        }
    }

    /// Returns `true` iff the value is neither infinite nor NaN.
    #[inline]
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        matches!(self.special, Special::Finite)
    }

    /// Returns `true` iff the value is NaN.
    #[inline]
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self.special, Special::NaN)
    }

    /// Returns `true` iff the value is an infinity.
    #[inline]
    #[must_use]
    pub const fn is_infinite(&self) -> bool {
        matches!(self.special, Special::Infinity)
    }

    /// Sign flag. Negative zero and negative infinity report `true`; NaN reports `false`.
    #[inline]
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns `true` iff the value is a (signed) zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.is_finite() && self.mantissa.is_zero()
    }

    /// The unsigned mantissa.
    #[must_use]
    pub const fn unsigned_mantissa(&self) -> &BigUint {
        &self.mantissa
    }

    /// The signed mantissa (zero for a negative zero).
    #[must_use]
    pub fn mantissa(&self) -> BigInt {
        let sign = if self.negative {
            BigSign::Minus
        } else {
            BigSign::Plus
        };
        BigInt::from_biguint(sign, self.mantissa.clone())
    }

    /// The exponent.
    #[must_use]
    pub const fn exponent(&self) -> &BigInt {
        &self.exponent
    }

    /// Flip the sign. Zero becomes negative zero and vice versa.
    #[must_use]
    pub fn negate(&self) -> Self {
        let mut out = self.clone();
        if !out.is_nan() {
            out.negative = !out.negative;
        }
        out
    }

    /// Clear the sign.
    #[must_use]
    pub fn abs(&self) -> Self {
        let mut out = self.clone();
        out.negative = false;
        out
    }

    fn radix_pow(k: u64) -> BigUint {
        BigUint::from(RADIX).pow(u32::try_from(k).unwrap_or(u32::MAX))
    }

    /// Lower bound on `log2(RADIX)` used for magnitude estimates.
    const fn log2_radix_floor() -> u64 {
        if RADIX == 2 {
            1
        } else {
            3
        }
    }

    /// Returns `true` iff the value is finite and has no fractional part.
    #[must_use]
    pub fn is_integral(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        if self.mantissa.is_zero() || !self.exponent.is_negative() {
            return true;
        }
        let Some(k) = (-&self.exponent).to_u64() else {
            return false;
        };
        if k >= self.mantissa.bits() {
            // RADIX^k >= 2^k > mantissa.
            return false;
        }
        if RADIX == 2 {
            return self.mantissa.trailing_zeros().unwrap_or(0) >= k;
        }
        (&self.mantissa % Self::radix_pow(k)).is_zero()
    }

    /// Truncate toward zero, refusing results wider than `max_bits` bits.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for infinities and results that are too wide.
    pub fn to_bigint_within(&self, max_bits: u64) -> Result<BigInt, ErrorCode> {
        match self.special {
            Special::NaN => return Err(ErrorCode::NumberNaN),
            Special::Infinity => return Err(ErrorCode::NumberOverflow),
            Special::Finite => {}
        }
        if self.mantissa.is_zero() {
            return Ok(BigInt::zero());
        }
        let magnitude = if self.exponent.is_negative() {
            let k = (-&self.exponent).to_u64().unwrap_or(u64::MAX);
            if k >= self.mantissa.bits() {
                BigUint::zero()
            } else if RADIX == 2 {
                &self.mantissa >> k
            } else {
                &self.mantissa / Self::radix_pow(k)
            }
        } else {
            let k = self.exponent.to_u64().unwrap_or(u64::MAX);
            let min_bits = (self.mantissa.bits() - 1)
                .saturating_add(k.saturating_mul(Self::log2_radix_floor()));
            if min_bits >= max_bits || k > MAX_EXACT_EXPONENT {
                return Err(ErrorCode::NumberOverflow);
            }
            if RADIX == 2 {
                &self.mantissa << k
            } else {
                &self.mantissa * Self::radix_pow(k)
            }
        };
        if magnitude.bits() > max_bits {
            return Err(ErrorCode::NumberOverflow);
        }
        let sign = if self.negative {
            BigSign::Minus
        } else {
            BigSign::Plus
        };
        Ok(BigInt::from_biguint(sign, magnitude))
    }

    /// Truncate toward zero.
    ///
    /// # Errors
    ///
    /// `NumberNaN` for NaN, `NumberOverflow` for infinities and exponents beyond
    /// [`MAX_EXACT_EXPONENT`].
    pub fn to_bigint(&self) -> Result<BigInt, ErrorCode> {
        self.to_bigint_within(MAX_EXACT_EXPONENT.saturating_mul(4))
    }

    /// The exact value as a rational.
    ///
    /// # Errors
    ///
    /// `NumberNaN`/`NumberOverflow` for non-finite values, `NumberOverflow` for exponents beyond
    /// [`MAX_EXACT_EXPONENT`].
    pub fn to_rational(&self) -> Result<BigRational, ErrorCode> {
        let (n, d) = self.exact_ratio()?;
        let sign = if self.negative {
            BigSign::Minus
        } else {
            BigSign::Plus
        };
        Ok(BigRational::new(
            BigInt::from_biguint(sign, n),
            BigInt::from_biguint(BigSign::Plus, d),
        ))
    }

    /// `|value| = n / d` with `d > 0`.
    fn exact_ratio(&self) -> Result<(BigUint, BigUint), ErrorCode> {
        match self.special {
            Special::NaN => return Err(ErrorCode::NumberNaN),
            Special::Infinity => return Err(ErrorCode::NumberOverflow),
            Special::Finite => {}
        }
        if self.mantissa.is_zero() {
            return Ok((BigUint::zero(), BigUint::one()));
        }
        let negative_exp = self.exponent.is_negative();
        let k = self
            .exponent
            .abs()
            .to_u64()
            .filter(|k| *k <= MAX_EXACT_EXPONENT || (negative_exp && self.divisor_expandable(*k)))
            .ok_or(ErrorCode::NumberOverflow)?;
        if negative_exp {
            Ok((self.mantissa.clone(), Self::radix_pow(k)))
        } else {
            Ok((&self.mantissa * Self::radix_pow(k), BigUint::one()))
        }
    }

    /// Returns `true` iff `RADIX^k` is at most [`DIVISOR_SLACK_BITS`] longer than the mantissa.
    fn divisor_expandable(&self, k: u64) -> bool {
        // log2(10) > 3.32
        let min_bits = if RADIX == 2 {
            k
        } else {
            k.saturating_mul(332) / 100
        };
        min_bits <= self.mantissa.bits().saturating_add(DIVISOR_SLACK_BITS)
    }

    /// Rough base-2 magnitude: the value lies in `[2^(lo), 2^(hi))`. `None` for zero.
    fn log2_bounds(&self) -> Option<(i64, i64)> {
        if self.mantissa.is_zero() {
            return None;
        }
        let bits = i64::try_from(self.mantissa.bits()).unwrap_or(i64::MAX);
        let Some(exp) = self.exponent.to_i64() else {
            return Some(if self.exponent.is_negative() {
                (i64::MIN / 2, i64::MIN / 2)
            } else {
                (i64::MAX / 2, i64::MAX / 2)
            });
        };
        if RADIX == 2 {
            Some((bits - 1 + exp, bits + exp))
        } else {
            // log2(10) lies in (3.32, 3.33).
            let lo = exp.saturating_mul(332) / 100;
            let hi = exp.saturating_mul(333) / 100;
            let (lo, hi) = if exp < 0 { (hi - 1, lo + 1) } else { (lo, hi + 1) };
            Some((bits - 1 + lo, bits + hi))
        }
    }

    fn round_to_float(&self, precision: u32, min_exp: i64, max_exp: i64) -> f64 {
        match self.special {
            Special::NaN => return f64::NAN,
            Special::Infinity => {
                return if self.negative {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
            Special::Finite => {}
        }
        let signed = |v: f64| if self.negative { -v } else { v };
        let Some((lo, hi)) = self.log2_bounds() else {
            return signed(0.0);
        };
        if lo > max_exp {
            return signed(f64::INFINITY);
        }
        if hi < min_exp - 2 {
            return signed(0.0);
        }
        match self.exact_ratio() {
            Ok((n, d)) => signed(ratio_to_float(&n, &d, precision, min_exp)),
            Err(_) => signed(if lo > 0 { f64::INFINITY } else { 0.0 }),
        }
    }

    /// The nearest float64 (round half to even).
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.round_to_float(53, -1074, 1024)
    }

    /// The nearest float32 (round half to even), rounded once from the exact value.
    #[must_use]
    pub fn to_f32(&self) -> f32 {
        #[allow(clippy::cast_possible_truncation)]
        let single = self.round_to_float(24, -149, 128) as f32;
        single
    }

    /// Compare numeric values. `None` if either side is NaN.
    #[must_use]
    pub fn numeric_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        let rank = |v: &Self| -> i8 {
            match (v.special, v.negative, v.mantissa.is_zero()) {
                (Special::Infinity, true, _) => -2,
                (Special::Infinity, false, _) => 2,
                (_, _, true) => 0,
                (_, true, false) => -1,
                (_, false, false) => 1,
            }
        };
        let (ra, rb) = (rank(self), rank(other));
        if ra != rb || ra.abs() != 1 {
            return Some(ra.cmp(&rb));
        }
        let magnitude = match (self.exact_ratio(), other.exact_ratio()) {
            (Ok((an, ad)), Ok((bn, bd))) => (an * bd).cmp(&(bn * ad)),
            _ => {
                let (alo, ahi) = self.log2_bounds().unwrap_or((0, 0));
                let (blo, bhi) = other.log2_bounds().unwrap_or((0, 0));
                if ahi <= blo {
                    Ordering::Less
                } else if bhi <= alo {
                    Ordering::Greater
                } else {
                    self.cmp_aligned(other)
                }
            }
        };
        Some(if ra < 0 { magnitude.reverse() } else { magnitude })
    }

    /// Compare the magnitudes of two finite non-zero values by scaling the mantissa with the
    /// larger exponent down to the smaller exponent.
    fn cmp_aligned(&self, other: &Self) -> Ordering {
        let shift = &self.exponent - &other.exponent;
        if shift.is_zero() {
            return self.mantissa.cmp(&other.mantissa);
        }
        let k = shift.abs().to_u64().unwrap_or(u64::MAX);
        let longest = self.mantissa.bits().max(other.mantissa.bits());
        let min_scale_bits = if RADIX == 2 {
            k
        } else {
            k.saturating_mul(332) / 100
        };
        // The radix power alone outweighs any mantissa: the larger exponent is the larger value.
        if min_scale_bits > longest.saturating_add(DIVISOR_SLACK_BITS) {
            return shift.cmp(&BigInt::zero());
        }
        let scale = |m: &BigUint| {
            if RADIX == 2 {
                m << k
            } else {
                m * Self::radix_pow(k)
            }
        };
        if shift.is_positive() {
            scale(&self.mantissa).cmp(&other.mantissa)
        } else {
            self.mantissa.cmp(&scale(&other.mantissa))
        }
    }

    fn from_exact_ratio(value: &BigRational) -> Result<Self, ErrorCode> {
        let negative = value.is_negative();
        let numer = value.numer().magnitude().clone();
        let mut denom = value.denom().magnitude().clone();
        let two = BigUint::from(2u32);
        let five = BigUint::from(5u32);
        let mut twos = 0u64;
        let mut fives = 0u64;
        while denom.is_even() {
            denom /= &two;
            twos += 1;
        }
        if RADIX == 10 {
            while (&denom % &five).is_zero() {
                denom /= &five;
                fives += 1;
            }
        }
        if !denom.is_one() {
            return Err(ErrorCode::InexactConversion);
        }
        if RADIX == 2 {
            return Ok(Self::from_parts(negative, numer, -BigInt::from(twos)));
        }
        let k = twos.max(fives);
        let scale = BigUint::from(2u32).pow(u32::try_from(k - twos).unwrap_or(u32::MAX))
            * five.pow(u32::try_from(k - fives).unwrap_or(u32::MAX));
        Ok(Self::from_parts(negative, numer * scale, -BigInt::from(k)))
    }

    /// Exact conversion of a rational whose denominator divides a power of `RADIX`.
    ///
    /// # Errors
    ///
    /// `InexactConversion` if the rational has no terminating expansion in this radix.
    pub fn from_rational(value: &BigRational) -> Result<Self, ErrorCode> {
        Self::from_exact_ratio(value)
    }
}

impl BigFloat {
    /// Exact decimal value of this binary float.
    ///
    /// # Errors
    ///
    /// `NumberOverflow` if the exponent is beyond [`MAX_EXACT_EXPONENT`].
    pub fn to_decimal(&self) -> Result<BigDecimal, ErrorCode> {
        match self.special {
            Special::NaN => return Ok(BigDecimal::nan()),
            Special::Infinity => return Ok(BigDecimal::infinity(self.negative)),
            Special::Finite => {}
        }
        if self.mantissa.is_zero() {
            return Ok(BigDecimal::zero(self.negative));
        }
        let k = self
            .exponent
            .abs()
            .to_u64()
            .filter(|k| *k <= MAX_EXACT_EXPONENT)
            .ok_or(ErrorCode::NumberOverflow)?;
        if self.exponent.is_negative() {
            let five = BigUint::from(5u32).pow(u32::try_from(k).unwrap_or(u32::MAX));
            Ok(BigDecimal::from_parts(
                self.negative,
                &self.mantissa * five,
                self.exponent.clone(),
            ))
        } else {
            Ok(BigDecimal::from_parts(
                self.negative,
                &self.mantissa << k,
                BigInt::zero(),
            ))
        }
    }
}

impl BigDecimal {
    /// Exact binary value of this decimal.
    ///
    /// # Errors
    ///
    /// `InexactConversion` if the decimal has no terminating binary expansion, `NumberOverflow`
    /// if the exponent is beyond [`MAX_EXACT_EXPONENT`].
    pub fn to_binary(&self) -> Result<BigFloat, ErrorCode> {
        match self.special {
            Special::NaN => return Ok(BigFloat::nan()),
            Special::Infinity => return Ok(BigFloat::infinity(self.negative)),
            Special::Finite => {}
        }
        if self.mantissa.is_zero() {
            return Ok(BigFloat::zero(self.negative));
        }
        let k = self
            .exponent
            .abs()
            .to_u64()
            .filter(|k| *k <= MAX_EXACT_EXPONENT)
            .ok_or(ErrorCode::NumberOverflow)?;
        if !self.exponent.is_negative() {
            return Ok(BigFloat::from_parts(
                self.negative,
                &self.mantissa * Self::radix_pow(k),
                BigInt::zero(),
            ));
        }
        let five = BigUint::from(5u32).pow(u32::try_from(k).unwrap_or(u32::MAX));
        let (q, r) = self.mantissa.div_rem(&five);
        if !r.is_zero() {
            return Err(ErrorCode::InexactConversion);
        }
        Ok(BigFloat::from_parts(self.negative, q, self.exponent.clone()))
    }
}

/// Round `n / d` (both positive) to `precision` significant bits, half to even, with a result
/// exponent no smaller than `min_exp`, and return it as a float64.
fn ratio_to_float(n: &BigUint, d: &BigUint, precision: u32, min_exp: i64) -> f64 {
    if n.is_zero() {
        return 0.0;
    }
    let nb = i64::try_from(n.bits()).unwrap_or(i64::MAX);
    let db = i64::try_from(d.bits()).unwrap_or(i64::MAX);
    let mut e2 = (nb - db - i64::from(precision)).max(min_exp);
    loop {
        let (num, den) = if e2 >= 0 {
            (n.clone(), d << e2.unsigned_abs())
        } else {
            (n << e2.unsigned_abs(), d.clone())
        };
        let (q, r) = num.div_rem(&den);
        if q.bits() > u64::from(precision) {
            e2 += 1;
            continue;
        }
        let mut q = q.iter_u64_digits().next().unwrap_or(0);
        match (r << 1u32).cmp(&den) {
            Ordering::Greater => q += 1,
            Ordering::Equal if q & 1 == 1 => q += 1,
            _ => {}
        }
        if q >> precision != 0 {
            q >>= 1;
            e2 += 1;
        }
        #[allow(clippy::cast_precision_loss)]
        return scale_pow2(q as f64, e2);
    }
}

/// `2^e` for `e` in the normal float64 exponent range.
fn pow2(e: i64) -> f64 {
    let biased = u64::try_from(e.clamp(-1022, 1023) + 1023).unwrap_or(0);
    f64::from_bits(biased << 52)
}

/// `x * 2^e`, exact whenever the result is representable.
fn scale_pow2(x: f64, e: i64) -> f64 {
    if e > 1023 {
        x * pow2(1023) * pow2(e - 1023)
    } else if e < -1022 {
        x * pow2(-1022) * pow2(e + 1022)
    } else {
        x * pow2(e)
    }
}

/// Rational to float64, rounded once.
pub(crate) fn rational_to_f64(value: &BigRational) -> f64 {
    rational_round(value, 53, -1074)
}

/// Rational to float32, rounded once.
pub(crate) fn rational_to_f32(value: &BigRational) -> f32 {
    #[allow(clippy::cast_possible_truncation)]
    let single = rational_round(value, 24, -149) as f32;
    single
}

fn rational_round(value: &BigRational, precision: u32, min_exp: i64) -> f64 {
    let v = ratio_to_float(
        value.numer().magnitude(),
        value.denom().magnitude(),
        precision,
        min_exp,
    );
    if value.is_negative() {
        -v
    } else {
        v
    }
}

impl<const RADIX: u32> fmt::Display for Scaled<RADIX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.special {
            Special::NaN => return f.write_str("NaN"),
            Special::Infinity => {
                return f.write_str(if self.negative {
                    "-Infinity"
                } else {
                    "Infinity"
                })
            }
            Special::Finite => {}
        }
        if RADIX == 2 {
            let binary =
                BigFloat::from_parts(self.negative, self.mantissa.clone(), self.exponent.clone());
            return match binary.to_decimal() {
                Ok(d) => fmt::Display::fmt(&d, f),
                Err(_) => write!(f, "{:?}", self.to_f64()),
            };
        }
        if self.negative {
            f.write_str("-")?;
        }
        let digits = self.mantissa.to_str_radix(10);
        let n = digits.len();
        let adjusted = &self.exponent + BigInt::from(n - 1);
        if !self.exponent.is_positive() && adjusted >= BigInt::from(-6) {
            let k = (-&self.exponent).to_usize().unwrap_or(0);
            if k == 0 {
                f.write_str(&digits)
            } else if k < n {
                write!(f, "{}.{}", &digits[..n - k], &digits[n - k..])
            } else {
                write!(f, "0.{}{digits}", "0".repeat(k - n))
            }
        } else {
            f.write_str(&digits[..1])?;
            if n > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            if adjusted.is_negative() {
                write!(f, "E{adjusted}")
            } else {
                write!(f, "E+{adjusted}")
            }
        }
    }
}
