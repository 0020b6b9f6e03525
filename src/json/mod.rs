//! JSON text to and from CBOR values.
//!
//! Reading accepts RFC 8259 JSON from strings, byte buffers in any Unicode encoding form (detected
//! from the first bytes), or streams. Writing produces UTF-8 JSON text; byte strings become
//! base64url, base64 or base16 text according to tags 21-23.

mod number;
mod parser;
mod writer;

use std::io::{Read, Write};

use crate::options::JsonOptions;
use crate::text::{CharacterInput, CharacterReader, StrInput};
use crate::{CborError, CborValue};

pub use number::{parse_json_number, parse_json_number_range};
pub use writer::format_f64;

use parser::JsonParser;

/// Parse JSON from any character source.
///
/// # Errors
///
/// A malformed-input error at the character offset where parsing failed.
pub fn from_json_input<I: CharacterInput>(
    input: I,
    options: &JsonOptions,
) -> Result<CborValue, CborError> {
    JsonParser::new(input, options).parse_document()
}

/// Parse a JSON string.
///
/// # Errors
///
/// A malformed-input error at the character offset where parsing failed.
pub fn from_json_str(s: &str, options: &JsonOptions) -> Result<CborValue, CborError> {
    from_json_input(StrInput::new(s), options)
}

/// Parse JSON bytes, detecting UTF-8, UTF-16 or UTF-32.
///
/// # Errors
///
/// A malformed-input error for invalid text or JSON.
pub fn from_json_bytes(bytes: &[u8], options: &JsonOptions) -> Result<CborValue, CborError> {
    from_json_input(CharacterReader::new(bytes, false), options)
}

/// Parse JSON from a byte stream, detecting its encoding.
///
/// # Errors
///
/// A malformed-input error for invalid text or JSON, `IoFailure` if the stream fails.
pub fn from_json_reader<R: Read>(reader: R, options: &JsonOptions) -> Result<CborValue, CborError> {
    from_json_input(CharacterReader::new(reader, false), options)
}

/// Render `value` as JSON text.
///
/// # Errors
///
/// `DuplicateMapKey` if two keys of a map with non-text keys have the same text form.
pub fn to_json_string(value: &CborValue, options: &JsonOptions) -> Result<String, CborError> {
    let mut out = String::new();
    writer::write_value(&mut out, value, options)?;
    Ok(out)
}

/// Write `value` as UTF-8 JSON text.
///
/// # Errors
///
/// As for [`to_json_string`], plus `IoFailure` if the writer fails.
pub fn write_json<W: Write>(
    value: &CborValue,
    mut writer: W,
    options: &JsonOptions,
) -> Result<(), CborError> {
    let text = to_json_string(value, options)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}
