//! Tags 0 and 1: date/time strings and epoch-based date/time.

use core::fmt::Write as _;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::ToPrimitive;

use crate::number::{BigDecimal, CborNumber};
use crate::{CborError, CborValue, ErrorCode};

const SECONDS_PER_DAY: i64 = 86_400;
const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// A calendar date and time broken into fields.
///
/// The year is unbounded so that any finite epoch value has a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTimeFields {
    /// Proleptic Gregorian year.
    pub year: BigInt,
    /// Month, 1..=12.
    pub month: u8,
    /// Day of month, 1..=31.
    pub day: u8,
    /// Hour, 0..=23.
    pub hour: u8,
    /// Minute, 0..=59.
    pub minute: u8,
    /// Second, 0..=60 (60 only for a leap second in a date/time string).
    pub second: u8,
    /// Fractional second in nanoseconds.
    pub nanosecond: u32,
    /// Offset from UTC in minutes.
    pub offset_minutes: i16,
}

fn date_err() -> CborError {
    CborError::at_start(ErrorCode::TagDateFormat)
}

fn is_leap(year: &BigInt) -> bool {
    let div = |n: u32| year.is_multiple_of(&BigInt::from(n));
    div(4) && (!div(100) || div(400))
}

fn days_in_month(year: &BigInt, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn digits(s: &[u8], at: usize, n: usize) -> Result<u32, CborError> {
    let part = s.get(at..at + n).ok_or_else(date_err)?;
    part.iter().try_fold(0u32, |acc, b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + u32::from(b - b'0'))
        } else {
            Err(date_err())
        }
    })
}

fn expect(s: &[u8], at: usize, accepted: &[u8]) -> Result<(), CborError> {
    match s.get(at) {
        Some(b) if accepted.contains(b) => Ok(()),
        _ => Err(date_err()),
    }
}

fn narrow(v: u32) -> u8 {
    u8::try_from(v).unwrap_or(u8::MAX)
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: &BigInt) -> (BigInt, u8, u8) {
    let z: BigInt = days + 719_468i64;
    let (era, doe) = z.div_mod_floor(&BigInt::from(146_097));
    let doe = doe.to_i64().unwrap_or(0);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = era * 400i64 + yoe + i64::from(month <= 2);
    (
        year,
        u8::try_from(month).unwrap_or(1),
        u8::try_from(day).unwrap_or(1),
    )
}

/// (year, month, day) to days since 1970-01-01.
fn days_from_civil(year: &BigInt, month: u8, day: u8) -> BigInt {
    let y = if month <= 2 { year - 1i64 } else { year.clone() };
    let (era, yoe) = y.div_mod_floor(&BigInt::from(400));
    let yoe = yoe.to_i64().unwrap_or(0);
    let m = i64::from(month);
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097i64 + doe - 719_468i64
}

impl DateTimeFields {
    /// Parse `YYYY-MM-DDThh:mm:ss[.fraction](Z|±hh:mm)`.
    ///
    /// Fraction digits beyond nanosecond precision are accepted and truncated.
    ///
    /// # Errors
    ///
    /// `TagDateFormat` if the string does not match the grammar or a field is out of range.
    pub fn parse(s: &str) -> Result<Self, CborError> {
        let b = s.as_bytes();
        let year = digits(b, 0, 4)?;
        expect(b, 4, b"-")?;
        let month = digits(b, 5, 2)?;
        expect(b, 7, b"-")?;
        let day = digits(b, 8, 2)?;
        expect(b, 10, b"Tt")?;
        let hour = digits(b, 11, 2)?;
        expect(b, 13, b":")?;
        let minute = digits(b, 14, 2)?;
        expect(b, 16, b":")?;
        let second = digits(b, 17, 2)?;

        let mut at = 19;
        let mut nanosecond = 0u32;
        if b.get(at) == Some(&b'.') {
            at += 1;
            let start = at;
            let mut scale = NANOS_PER_SECOND / 10;
            while let Some(d) = b.get(at).filter(|d| d.is_ascii_digit()) {
                nanosecond += u32::from(d - b'0') * scale;
                scale /= 10;
                at += 1;
            }
            if at == start {
                return Err(date_err());
            }
        }

        let offset_minutes = match b.get(at) {
            Some(b'Z' | b'z') => {
                at += 1;
                0
            }
            Some(sign @ (b'+' | b'-')) => {
                let oh = digits(b, at + 1, 2)?;
                expect(b, at + 3, b":")?;
                let om = digits(b, at + 4, 2)?;
                if oh > 23 || om > 59 {
                    return Err(date_err());
                }
                at += 6;
                let total = i16::try_from(oh * 60 + om).map_err(|_| date_err())?;
                if *sign == b'-' {
                    -total
                } else {
                    total
                }
            }
            _ => return Err(date_err()),
        };
        if at != b.len() {
            return Err(date_err());
        }

        let year = BigInt::from(year);
        let (month, day) = (narrow(month), narrow(day));
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(&year, month)
            || hour > 23
            || minute > 59
            || second > 60
        {
            return Err(date_err());
        }
        Ok(Self {
            year,
            month,
            day,
            hour: narrow(hour),
            minute: narrow(minute),
            second: narrow(second),
            nanosecond,
            offset_minutes,
        })
    }

    /// Break an epoch-seconds number (tag 1 payload) into UTC fields.
    ///
    /// # Errors
    ///
    /// `TagPayloadType` for NaN or infinities, `NumberOverflow` for exponents too large to
    /// expand.
    pub fn from_epoch_seconds(seconds: &CborNumber) -> Result<Self, CborError> {
        if !seconds.is_finite() {
            return Err(CborError::at_start(ErrorCode::TagPayloadType));
        }
        let exact: BigRational = seconds.to_rational()?;
        let whole = exact.floor();
        let nanos = ((&exact - &whole) * BigInt::from(NANOS_PER_SECOND))
            .floor()
            .to_integer();
        let (days, secs) = whole
            .to_integer()
            .div_mod_floor(&BigInt::from(SECONDS_PER_DAY));
        let secs = secs.to_i64().unwrap_or(0);
        let (year, month, day) = civil_from_days(&days);
        Ok(Self {
            year,
            month,
            day,
            hour: u8::try_from(secs / 3600).unwrap_or(0),
            minute: u8::try_from(secs % 3600 / 60).unwrap_or(0),
            second: u8::try_from(secs % 60).unwrap_or(0),
            nanosecond: nanos.to_u32().unwrap_or(0),
            offset_minutes: 0,
        })
    }

    /// Seconds since the epoch, as an integer when there is no fractional part and as a decimal
    /// otherwise.
    #[must_use]
    pub fn to_epoch_seconds(&self) -> CborNumber {
        let days = days_from_civil(&self.year, self.month, self.day);
        let secs = days * SECONDS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
            - i64::from(self.offset_minutes) * 60;
        if self.nanosecond == 0 {
            return CborNumber::from_bigint(secs);
        }
        let scaled = secs * i64::from(NANOS_PER_SECOND) + i64::from(self.nanosecond);
        CborNumber::Decimal(BigDecimal::new(scaled, -9))
    }

    /// Format as a tag 0 string. Trailing zeros of the fraction are dropped.
    ///
    /// # Errors
    ///
    /// `TagDateFormat` if the year is outside `0..=9999`.
    pub fn format(&self) -> Result<String, CborError> {
        let year = self
            .year
            .to_u32()
            .filter(|y| *y <= 9999)
            .ok_or_else(date_err)?;
        let mut out = format!(
            "{year:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.month, self.day, self.hour, self.minute, self.second
        );
        if self.nanosecond != 0 {
            let frac = format!("{:09}", self.nanosecond);
            let _ = write!(out, ".{}", frac.trim_end_matches('0'));
        }
        if self.offset_minutes == 0 {
            out.push('Z');
        } else {
            let sign = if self.offset_minutes < 0 { '-' } else { '+' };
            let m = self.offset_minutes.unsigned_abs();
            let _ = write!(out, "{sign}{:02}:{:02}", m / 60, m % 60);
        }
        Ok(out)
    }

    /// Read a tag 0 or tag 1 value.
    ///
    /// # Errors
    ///
    /// `TagPayloadType` for other values, plus the errors of [`DateTimeFields::parse`] and
    /// [`DateTimeFields::from_epoch_seconds`].
    pub fn from_value(value: &CborValue) -> Result<Self, CborError> {
        match value {
            CborValue::Tag(0, payload) => match payload.as_ref() {
                CborValue::Text(s) => Self::parse(s),
                _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
            },
            CborValue::Tag(1, payload) => {
                let n = CborNumber::from_value(payload)
                    .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
                Self::from_epoch_seconds(&n)
            }
            _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
        }
    }

    /// The tag 0 form.
    ///
    /// # Errors
    ///
    /// As for [`DateTimeFields::format`].
    pub fn to_value(&self) -> Result<CborValue, CborError> {
        Ok(CborValue::tagged(0, self.format()?))
    }
}

