//! Byte-to-text encodings used when writing byte strings as JSON.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::error::check_range;
use crate::CborError;

/// Text encodings for byte strings (tags 21, 22 and 23).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteEncoding {
    /// RFC 4648 §5 base64url (tag 21, and the default for untagged bytes).
    #[default]
    Base64Url,
    /// RFC 4648 §4 base64 (tag 22).
    Base64,
    /// Lowercase hex (tag 23).
    Base16,
}

impl ByteEncoding {
    /// The encoding requested by an expected-conversion tag.
    #[must_use]
    pub const fn for_tag(tag: u64) -> Option<Self> {
        match tag {
            21 => Some(Self::Base64Url),
            22 => Some(Self::Base64),
            23 => Some(Self::Base16),
            _ => None,
        }
    }

    /// Append the encoding of `bytes` to `out`. `padding` applies to the base64 variants.
    pub fn encode_into(self, bytes: &[u8], padding: bool, out: &mut String) {
        match (self, padding) {
            (Self::Base64Url, true) => URL_SAFE.encode_string(bytes, out),
            (Self::Base64Url, false) => URL_SAFE_NO_PAD.encode_string(bytes, out),
            (Self::Base64, true) => STANDARD.encode_string(bytes, out),
            (Self::Base64, false) => STANDARD_NO_PAD.encode_string(bytes, out),
            (Self::Base16, _) => out.push_str(&hex::encode(bytes)),
        }
    }

    /// Encode `bytes` to a new string.
    #[must_use]
    pub fn encode(self, bytes: &[u8], padding: bool) -> String {
        let mut out = String::new();
        self.encode_into(bytes, padding, &mut out);
        out
    }

    /// Encode `bytes[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// `ArgumentOutOfRange` if the window is not inside `bytes`.
    pub fn encode_range(
        self,
        bytes: &[u8],
        offset: usize,
        len: usize,
        padding: bool,
    ) -> Result<String, CborError> {
        check_range(bytes.len(), offset, len)?;
        Ok(self.encode(&bytes[offset..offset + len], padding))
    }
}

/// Base64 with the standard alphabet.
#[must_use]
pub fn to_base64(bytes: &[u8], padding: bool) -> String {
    ByteEncoding::Base64.encode(bytes, padding)
}

/// Base64 with the URL-safe alphabet.
#[must_use]
pub fn to_base64url(bytes: &[u8], padding: bool) -> String {
    ByteEncoding::Base64Url.encode(bytes, padding)
}

/// Lowercase hex.
#[must_use]
pub fn to_base16(bytes: &[u8]) -> String {
    ByteEncoding::Base16.encode(bytes, false)
}
