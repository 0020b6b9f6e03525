//! UTF-8 validation and UTF-16 conversion.

#[cfg(feature = "simdutf8")]
use simdutf8::basic as simd_utf8;

use crate::{CborError, ErrorCode};

/// Validates UTF-8 bytes and returns a borrowed `&str` on success.
///
/// # Errors
///
/// `Utf8Invalid` at `offset` if the bytes are not UTF-8.
#[inline]
pub fn validate(bytes: &[u8], offset: usize) -> Result<&str, CborError> {
    #[cfg(feature = "simdutf8")]
    {
        simd_utf8::from_utf8(bytes).map_err(|_| CborError::new(ErrorCode::Utf8Invalid, offset))
    }

    #[cfg(not(feature = "simdutf8"))]
    {
        core::str::from_utf8(bytes).map_err(|_| CborError::new(ErrorCode::Utf8Invalid, offset))
    }
}

/// Decode UTF-8, failing on the first malformed sequence.
///
/// # Errors
///
/// `Utf8Invalid` if the bytes are not UTF-8.
pub fn decode_strict(bytes: &[u8]) -> Result<String, CborError> {
    validate(bytes, 0).map(str::to_owned)
}

/// Decode UTF-8, substituting U+FFFD for each malformed sequence.
#[must_use]
pub fn decode_replace(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Convert UTF-16 code units to a string. Unpaired surrogates fail unless `replace` is set, in
/// which case each becomes U+FFFD.
///
/// # Errors
///
/// `Utf16Invalid` for an unpaired surrogate when `replace` is off.
pub fn from_utf16(units: &[u16], replace: bool) -> Result<String, CborError> {
    let mut out = String::with_capacity(units.len());
    for (i, unit) in char::decode_utf16(units.iter().copied()).enumerate() {
        match unit {
            Ok(c) => out.push(c),
            Err(_) if replace => out.push(char::REPLACEMENT_CHARACTER),
            Err(_) => return Err(CborError::new(ErrorCode::Utf16Invalid, i)),
        }
    }
    Ok(out)
}

/// Number of bytes the UTF-8 form of `units` occupies, under the same surrogate rules as
/// [`from_utf16`].
///
/// # Errors
///
/// `Utf16Invalid` for an unpaired surrogate when `replace` is off.
pub fn utf16_encoded_len(units: &[u16], replace: bool) -> Result<usize, CborError> {
    char::decode_utf16(units.iter().copied())
        .enumerate()
        .try_fold(0usize, |acc, (i, unit)| match unit {
            Ok(c) => Ok(acc + c.len_utf8()),
            Err(_) if replace => Ok(acc + char::REPLACEMENT_CHARACTER.len_utf8()),
            Err(_) => Err(CborError::new(ErrorCode::Utf16Invalid, i)),
        })
}
