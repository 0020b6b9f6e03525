//! Tag 37: binary UUIDs.
//!
//! The tag payload is the 16 bytes of RFC 4122 §4.1.2 in network byte order, which is also the
//! order the hyphenated string spells out. Microsoft GUID structures store the first three fields
//! little-endian; [`Uuid::to_mixed_endian`] and [`Uuid::from_mixed_endian`] convert to and from
//! that layout.

use core::fmt;
use core::str::FromStr;

use crate::{CborError, CborValue, ErrorCode};

/// CBOR tag number for binary UUIDs.
pub const TAG_UUID: u64 = 37;

/// A UUID in RFC 4122 network byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uuid([u8; 16]);

/// Byte permutation between network order and GUID mixed-endian order. It is its own inverse.
const MIXED_ENDIAN: [usize; 16] = [3, 2, 1, 0, 5, 4, 7, 6, 8, 9, 10, 11, 12, 13, 14, 15];

/// Hyphen positions in the 36-character form.
const GROUPS: [(usize, usize); 5] = [(0, 8), (9, 13), (14, 18), (19, 23), (24, 36)];

impl Uuid {
    /// Wrap 16 bytes in network order.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Copy 16 bytes in network order from a slice.
    ///
    /// # Errors
    ///
    /// `TagUuidLength` unless the slice has exactly 16 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CborError> {
        <[u8; 16]>::try_from(bytes)
            .map(Self)
            .map_err(|_| CborError::at_start(ErrorCode::TagUuidLength))
    }

    /// The bytes in network order.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The bytes in GUID mixed-endian order.
    #[must_use]
    pub fn to_mixed_endian(&self) -> [u8; 16] {
        MIXED_ENDIAN.map(|i| self.0[i])
    }

    /// Build from bytes in GUID mixed-endian order.
    #[must_use]
    pub fn from_mixed_endian(bytes: [u8; 16]) -> Self {
        Self(MIXED_ENDIAN.map(|i| bytes[i]))
    }

    /// The tag 37 value.
    #[must_use]
    pub fn to_value(&self) -> CborValue {
        CborValue::tagged(TAG_UUID, self.0.to_vec())
    }

    /// Read a tag 37 value.
    ///
    /// # Errors
    ///
    /// `TagPayloadType` unless the value is a tag 37 byte string, `TagUuidLength` unless it has 16
    /// bytes.
    pub fn from_value(value: &CborValue) -> Result<Self, CborError> {
        match value {
            CborValue::Tag(TAG_UUID, payload) => match payload.as_ref() {
                CborValue::Bytes(b) => Self::from_slice(b),
                _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
            },
            _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
        }
    }
}

impl FromStr for Uuid {
    type Err = CborError;

    /// Parse the 36-character hyphenated form, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CborError::at_start(ErrorCode::UuidString);
        let s = s.as_bytes();
        if s.len() != 36 || [8, 13, 18, 23].iter().any(|&i| s[i] != b'-') {
            return Err(err());
        }
        let mut out = [0u8; 16];
        let mut at = 0;
        for (start, end) in GROUPS {
            let n = (end - start) / 2;
            hex::decode_to_slice(&s[start..end], &mut out[at..at + n]).map_err(|_| err())?;
            at += n;
        }
        Ok(Self(out))
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{}-{}-{}-{}-{}",
            hex::encode(&b[0..4]),
            hex::encode(&b[4..6]),
            hex::encode(&b[6..8]),
            hex::encode(&b[8..10]),
            hex::encode(&b[10..16])
        )
    }
}
