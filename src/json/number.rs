//! JSON number grammar, parsed in one pass without going through float parsing.

use num_bigint::{BigInt, BigUint, Sign as BigSign};
use num_traits::Zero;

use crate::error::check_range;
use crate::number::{BigDecimal, CborNumber};
use crate::options::{JsonOptions, NumberConversion};
use crate::CborError;

/// Digits accumulate in an `i32` while the value stays below this bound; one more digit can then
/// never overflow.
const SMALL_LIMIT: i32 = 214_748_364;

/// Digits gathered before the limbs are multiplied through once.
const BATCH_DIGITS: u32 = 9;

/// Decimal digit accumulator: a machine integer that spills into little-endian `u32` limbs.
///
/// Once spilled, digits are batched nine at a time so each pass over the limbs takes in a whole
/// `10^9` step.
#[derive(Debug, Default)]
struct DigitAccumulator {
    small: i32,
    limbs: Vec<u32>,
    batch: u32,
    batch_len: u32,
}

impl DigitAccumulator {
    fn push_digit(&mut self, digit: u8) {
        if self.limbs.is_empty() {
            if self.small < SMALL_LIMIT {
                self.small = self.small * 10 + i32::from(digit);
                return;
            }
            self.limbs.push(self.small.unsigned_abs());
        }
        self.batch = self.batch * 10 + u32::from(digit);
        self.batch_len += 1;
        if self.batch_len == BATCH_DIGITS {
            self.flush();
        }
    }

    /// Multiply the limbs by `10^batch_len` and add the batched digits.
    fn flush(&mut self) {
        if self.batch_len == 0 {
            return;
        }
        let factor = u64::from(10u32.pow(self.batch_len));
        let mut carry = u64::from(self.batch);
        for limb in &mut self.limbs {
            let v = u64::from(*limb) * factor + carry;
            #[allow(clippy::cast_possible_truncation)]
            {
                *limb = v as u32;
            }
            carry = v >> 32;
        }
        if carry != 0 {
            #[allow(clippy::cast_possible_truncation)]
            self.limbs.push(carry as u32);
        }
        self.batch = 0;
        self.batch_len = 0;
    }

    fn is_zero(&self) -> bool {
        self.small == 0 && self.limbs.iter().all(|l| *l == 0)
    }

    fn to_bigint(&self, negative: bool) -> BigInt {
        let sign = if negative { BigSign::Minus } else { BigSign::Plus };
        if self.limbs.is_empty() {
            return BigInt::from_biguint(sign, BigUint::from(self.small.unsigned_abs()));
        }
        BigInt::from_biguint(sign, BigUint::new(self.limbs.clone()))
    }

    fn to_signed_i64(&self, negative: bool) -> Option<i64> {
        if !self.limbs.is_empty() {
            return None;
        }
        let v = i64::from(self.small);
        Some(if negative { -v } else { v })
    }
}

fn digits_into(s: &[u8], mut i: usize, acc: &mut DigitAccumulator) -> (usize, usize) {
    let start = i;
    while let Some(d) = s.get(i).filter(|b| b.is_ascii_digit()) {
        acc.push_digit(d - b'0');
        i += 1;
    }
    acc.flush();
    (i, i - start)
}

/// Parse exact JSON number text into `(mantissa, exponent)` before any conversion mode applies.
fn parse_exact(s: &[u8], preserve_negative_zero: bool) -> Option<CborNumber> {
    let mut i = 0;
    let negative = s.first() == Some(&b'-');
    if negative {
        i += 1;
    }
    let mut mantissa = DigitAccumulator::default();
    match s.get(i) {
        Some(b'0') => {
            i += 1;
            if s.get(i).is_some_and(u8::is_ascii_digit) {
                return None;
            }
        }
        Some(b'1'..=b'9') => i = digits_into(s, i, &mut mantissa).0,
        _ => return None,
    }

    let mut fraction_digits = 0usize;
    if s.get(i) == Some(&b'.') {
        let (next, n) = digits_into(s, i + 1, &mut mantissa);
        if n == 0 {
            return None;
        }
        i = next;
        fraction_digits = n;
    }

    let mut exponent = BigInt::zero();
    if matches!(s.get(i), Some(b'e' | b'E')) {
        i += 1;
        let exp_negative = match s.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let mut acc = DigitAccumulator::default();
        let (next, n) = digits_into(s, i, &mut acc);
        if n == 0 {
            return None;
        }
        i = next;
        exponent = acc.to_bigint(exp_negative);
    }
    if i != s.len() {
        return None;
    }

    let scale = exponent - BigInt::from(fraction_digits);
    if mantissa.is_zero() && negative && preserve_negative_zero {
        return Some(CborNumber::Decimal(BigDecimal::from_parts(
            true,
            BigUint::zero(),
            scale,
        )));
    }
    let negative = negative && !mantissa.is_zero();
    if scale.is_zero() {
        return Some(match mantissa.to_signed_i64(negative) {
            Some(v) => CborNumber::Int64(v),
            None => CborNumber::from_bigint(mantissa.to_bigint(negative)),
        });
    }
    Some(CborNumber::Decimal(BigDecimal::new(
        mantissa.to_bigint(negative),
        scale,
    )))
}

fn apply_conversion(n: CborNumber, mode: NumberConversion) -> CborNumber {
    match mode {
        NumberConversion::Full => n,
        NumberConversion::Double => CborNumber::Float64(n.to_f64()),
        NumberConversion::IntOrFloat => {
            if n.is_integral() && !(n.is_zero() && n.is_negative()) {
                if let Ok(v) = n.to_i64() {
                    return CborNumber::Int64(v);
                }
            }
            CborNumber::Float64(n.to_f64())
        }
    }
}

/// Parse a JSON number.
///
/// Returns `None` if `s` does not match the JSON number grammar (leading zeros, a bare `-`, a
/// missing fraction or exponent digit, trailing characters). Integers stay integers of any size
/// and other numbers become exact decimal fractions, unless `options.number_conversion` says
/// otherwise. A `-0` keeps its sign only with `preserve_negative_zero`.
#[must_use]
pub fn parse_json_number(s: &str, options: &JsonOptions) -> Option<CborNumber> {
    let exact = parse_exact(s.as_bytes(), options.preserve_negative_zero)?;
    Some(apply_conversion(exact, options.number_conversion))
}

/// Parse the JSON number in `s[offset..offset + len]` (byte offsets).
///
/// # Errors
///
/// `ArgumentOutOfRange` if the window is not inside `s` or does not fall on character
/// boundaries. Grammar failures are reported as `Ok(None)`.
pub fn parse_json_number_range(
    s: &str,
    offset: usize,
    len: usize,
    options: &JsonOptions,
) -> Result<Option<CborNumber>, CborError> {
    check_range(s.len(), offset, len)?;
    let window = s
        .get(offset..offset + len)
        .ok_or_else(|| CborError::at_start(crate::ErrorCode::ArgumentOutOfRange))?;
    Ok(parse_json_number(window, options))
}

/// Characters that can appear in a JSON number literal.
#[must_use]
pub(crate) const fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
}

