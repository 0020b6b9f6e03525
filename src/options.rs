//! Encoding, decoding and JSON options.
//!
//! Every option struct also parses from the compact `key=value;key=value` form, with
//! case-insensitive keys and `true`/`false` values, e.g.
//! `"allowduplicatekeys=true;ctap2canonical=true"`.

use core::str::FromStr;

use crate::{CborError, ErrorCode};

/// Options for CBOR encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CborOptions {
    /// Write long strings as indefinite-length strings built from definite chunks.
    pub use_indef_length_strings: bool,
    /// Accept duplicate map keys on decode (the last value wins).
    pub allow_duplicate_keys: bool,
    /// Force CTAP2 canonical output.
    pub ctap2_canonical: bool,
    /// Resolve tag 28/29 shared references while decoding.
    pub resolve_references: bool,
}

impl CborOptions {
    /// Options producing CTAP2 canonical output.
    #[must_use]
    pub const fn canonical() -> Self {
        Self {
            use_indef_length_strings: false,
            allow_duplicate_keys: false,
            ctap2_canonical: true,
            resolve_references: false,
        }
    }
}

impl FromStr for CborOptions {
    type Err = CborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Self::default();
        for (key, value) in pairs(s)? {
            let flag = parse_bool(value)?;
            match key.as_str() {
                "useindeflengthstrings" => out.use_indef_length_strings = flag,
                "allowduplicatekeys" => out.allow_duplicate_keys = flag,
                "ctap2canonical" => out.ctap2_canonical = flag,
                "resolvereferences" => out.resolve_references = flag,
                _ => return Err(CborError::at_start(ErrorCode::InvalidOption)),
            }
        }
        Ok(out)
    }
}

/// How JSON numbers become CBOR numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberConversion {
    /// Exact: integers stay integers of any size, other numbers become decimal fractions.
    #[default]
    Full,
    /// Every number becomes a float64.
    Double,
    /// Integers that fit `i64` stay integers; everything else becomes a float64.
    IntOrFloat,
}

impl FromStr for NumberConversion {
    type Err = CborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "double" => Ok(Self::Double),
            "intorfloat" => Ok(Self::IntOrFloat),
            _ => Err(CborError::at_start(ErrorCode::InvalidOption)),
        }
    }
}

/// Options for JSON reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonOptions {
    /// Include `=` padding when writing byte strings as base64/base64url.
    pub base64_padding: bool,
    /// Accept duplicate object keys (the last value wins).
    pub allow_duplicate_keys: bool,
    /// Keep `-0` as a negative zero instead of collapsing it to integer zero.
    pub preserve_negative_zero: bool,
    /// Replace unpaired surrogate escapes with U+FFFD instead of failing.
    pub replace_surrogates: bool,
    /// Number conversion mode.
    pub number_conversion: NumberConversion,
}

impl FromStr for JsonOptions {
    type Err = CborError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Self::default();
        for (key, value) in pairs(s)? {
            match key.as_str() {
                "base64padding" => out.base64_padding = parse_bool(value)?,
                "allowduplicatekeys" => out.allow_duplicate_keys = parse_bool(value)?,
                "preservenegativezero" => out.preserve_negative_zero = parse_bool(value)?,
                "replacesurrogates" => out.replace_surrogates = parse_bool(value)?,
                "numberconversion" => out.number_conversion = value.parse()?,
                _ => return Err(CborError::at_start(ErrorCode::InvalidOption)),
            }
        }
        Ok(out)
    }
}

fn pairs(s: &str) -> Result<Vec<(String, &str)>, CborError> {
    let mut out = Vec::new();
    for part in s.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| CborError::at_start(ErrorCode::InvalidOption))?;
        out.push((key.trim().to_ascii_lowercase(), value.trim()));
    }
    Ok(out)
}

fn parse_bool(value: &str) -> Result<bool, CborError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CborError::at_start(ErrorCode::InvalidOption))
    }
}
