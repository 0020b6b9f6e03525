use std::collections::HashSet;
use std::fmt::Write as _;

use num_traits::{Signed, ToPrimitive};

use crate::number::{BigDecimal, CborNumber};
use crate::options::JsonOptions;
use crate::text::ByteEncoding;
use crate::{CborError, CborMap, CborValue, ErrorCode};

/// Bigfloats with exponents up to this magnitude are written exactly.
const EXACT_BIGFLOAT_EXPONENT: u64 = 4096;

/// Shortest round-trip text for a float64, without a trailing `.0`.
///
/// Non-finite values render as `NaN`, `Infinity` and `-Infinity`; the JSON writer never calls
/// this for them.
#[must_use]
pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-Infinity" } else { "Infinity" }.to_owned();
    }
    let mut s = format!("{value:?}");
    if s.ends_with(".0") {
        s.truncate(s.len() - 2);
    }
    s
}

fn write_number(out: &mut String, n: &CborNumber) {
    let text = match n {
        CborNumber::Int64(v) => v.to_string(),
        CborNumber::BigInteger(b) => b.to_string(),
        CborNumber::Float32(_) | CborNumber::Float64(_) => {
            let f = n.to_f64();
            if !f.is_finite() {
                return out.push_str("null");
            }
            format_f64(f)
        }
        CborNumber::Decimal(d) if !d.is_finite() => return out.push_str("null"),
        CborNumber::Decimal(d) => d.to_string(),
        CborNumber::BigFloat(b) if !b.is_finite() => return out.push_str("null"),
        CborNumber::BigFloat(b) => {
            let small_exponent = b
                .exponent()
                .abs()
                .to_u64()
                .is_some_and(|e| e <= EXACT_BIGFLOAT_EXPONENT);
            let exact = if small_exponent {
                b.to_decimal().ok()
            } else {
                None
            };
            match exact {
                Some(d) => d.to_string(),
                None => return write_float_or_null(out, b.to_f64()),
            }
        }
        CborNumber::Rational(r) => match BigDecimal::from_rational(r) {
            Ok(d) => d.to_string(),
            Err(_) => return write_float_or_null(out, n.to_f64()),
        },
    };
    out.push_str(&text);
}

fn write_float_or_null(out: &mut String, f: f64) {
    if f.is_finite() {
        out.push_str(&format_f64(f));
    } else {
        out.push_str("null");
    }
}

/// Append `s` as a JSON string literal.
pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            // Line/paragraph separators and BOM-like code points are escaped so the output can be
            // embedded in script.
            c if c < '\u{20}'
                || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}') =>
            {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// The byte-string encoding selected by the tag chain, outermost first.
fn byte_encoding(value: &CborValue) -> ByteEncoding {
    value
        .tags()
        .into_iter()
        .find_map(ByteEncoding::for_tag)
        .unwrap_or_default()
}

/// Text form of a non-text map key.
fn key_string(key: &CborValue, options: &JsonOptions) -> Result<String, CborError> {
    match key.untagged() {
        CborValue::Text(s) => Ok(s.clone()),
        CborValue::Bytes(b) => Ok(byte_encoding(key).encode(b, options.base64_padding)),
        _ => {
            let mut s = String::new();
            write_value(&mut s, key, options)?;
            Ok(s)
        }
    }
}

fn write_map(out: &mut String, map: &CborMap, options: &JsonOptions) -> Result<(), CborError> {
    out.push('{');
    let all_text = map.keys().all(|k| matches!(k, CborValue::Text(_)));
    let mut seen = HashSet::new();
    for (i, (k, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let key = if all_text {
            k.as_text().unwrap_or_default().to_owned()
        } else {
            key_string(k, options)?
        };
        if !all_text && !seen.insert(key.clone()) {
            return Err(CborError::at_start(ErrorCode::DuplicateMapKey));
        }
        write_string(out, &key);
        out.push(':');
        write_value(out, v, options)?;
    }
    out.push('}');
    Ok(())
}

/// Append the JSON text of `value`.
pub(crate) fn write_value(
    out: &mut String,
    value: &CborValue,
    options: &JsonOptions,
) -> Result<(), CborError> {
    if let Some(n) = CborNumber::from_value(value) {
        write_number(out, &n);
        return Ok(());
    }
    match value.untagged() {
        CborValue::Bytes(b) => {
            out.push('"');
            byte_encoding(value).encode_into(b, options.base64_padding, out);
            out.push('"');
        }
        CborValue::Text(s) => write_string(out, s),
        CborValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item, options)?;
            }
            out.push(']');
        }
        CborValue::Map(map) => write_map(out, map, options)?,
        CborValue::Bool(true) => out.push_str("true"),
        CborValue::Bool(false) => out.push_str("false"),
        CborValue::Integer(_) | CborValue::Float(_) => {
            if let Some(n) = CborNumber::from_value(value.untagged()) {
                write_number(out, &n);
            }
        }
        CborValue::Null | CborValue::Undefined | CborValue::Simple(_) | CborValue::Tag(..) => {
            out.push_str("null");
        }
    }
    Ok(())
}
