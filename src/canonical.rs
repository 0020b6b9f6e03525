//! CTAP2-style canonical CBOR.
//!
//! Canonical output is a pure function of the value: tags are dropped at every level, integers use
//! their shortest header, any other number is written as a float64, and map entries are sorted by
//! [`cmp_canonical_keys`]. Two values that differ only in map insertion order canonicalize to the
//! same bytes.

use core::cmp::Ordering;

use log::debug;

use crate::number::CborNumber;
use crate::wire::{write_header, write_len};
use crate::{CborError, CborInteger, CborValue, ErrorCode};

/// Owned canonical CBOR bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalCbor {
    bytes: Vec<u8>,
}

impl CanonicalCbor {
    /// Borrow the canonical bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the canonical bytes.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length of the encoding in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` iff the encoding is empty (never the case for a real value).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Compute the SHA-256 digest of the canonical bytes.
    #[cfg(feature = "sha2")]
    #[cfg_attr(docsrs, doc(cfg(feature = "sha2")))]
    #[must_use]
    pub fn sha256(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};
        let mut h = Sha256::new();
        h.update(&self.bytes);
        let out = h.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&out);
        digest
    }
}

impl AsRef<[u8]> for CanonicalCbor {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<CanonicalCbor> for Vec<u8> {
    fn from(value: CanonicalCbor) -> Self {
        value.bytes
    }
}

/// Encode `value` in canonical form.
///
/// # Errors
///
/// `CanonicalInvariant` if the value cannot be written canonically. This happens only when two
/// keys of one map become identical once their tags are dropped.
pub fn canonical_encode(value: &CborValue) -> Result<CanonicalCbor, CborError> {
    let mut bytes = Vec::new();
    write_canonical(&mut bytes, value).map_err(|e| {
        debug!("canonical encode failed: {:?}", e.code);
        CborError::at_start(ErrorCode::CanonicalInvariant)
    })?;
    Ok(CanonicalCbor { bytes })
}

/// The canonical map-key order.
///
/// Two byte strings compare by their raw bytes. Any other pair compares by the major type of the
/// canonical encodings, then by encoded length, then byte-lexicographically.
///
/// # Errors
///
/// `CanonicalInvariant` if either key cannot be encoded canonically.
pub fn cmp_canonical_keys(a: &CborValue, b: &CborValue) -> Result<Ordering, CborError> {
    if let (CborValue::Bytes(x), CborValue::Bytes(y)) = (a.untagged(), b.untagged()) {
        return Ok(x.cmp(y));
    }
    let ea = canonical_encode(a)?;
    let eb = canonical_encode(b)?;
    Ok(cmp_encoded(ea.as_bytes(), eb.as_bytes()))
}

/// Order two canonical encodings: major type, then length, then bytes.
#[inline]
#[must_use]
fn cmp_encoded(a: &[u8], b: &[u8]) -> Ordering {
    let major = |e: &[u8]| e.first().map_or(0, |ib| ib >> 5);
    major(a)
        .cmp(&major(b))
        .then_with(|| a.len().cmp(&b.len()))
        .then_with(|| a.cmp(b))
}

struct EncodedEntry<'a> {
    raw_bytes: Option<&'a [u8]>,
    key: Vec<u8>,
    value: &'a CborValue,
}

impl EncodedEntry<'_> {
    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self.raw_bytes, other.raw_bytes) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => cmp_encoded(&self.key, &other.key),
        }
    }
}

fn write_canonical(out: &mut Vec<u8>, value: &CborValue) -> Result<(), CborError> {
    let mut cur = value;
    loop {
        if let Some(n) = CborNumber::from_value(cur) {
            write_number(out, &n);
            return Ok(());
        }
        match cur {
            CborValue::Tag(_, inner) => cur = inner,
            _ => break,
        }
    }

    match cur {
        CborValue::Bytes(b) => {
            write_len(out, 2, b.len());
            out.extend_from_slice(b);
        }
        CborValue::Text(s) => {
            write_len(out, 3, s.len());
            out.extend_from_slice(s.as_bytes());
        }
        CborValue::Array(items) => {
            write_len(out, 4, items.len());
            for item in items {
                write_canonical(out, item)?;
            }
        }
        CborValue::Map(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map.iter() {
                let mut key = Vec::new();
                write_canonical(&mut key, k)?;
                let raw_bytes = match k.untagged() {
                    CborValue::Bytes(b) => Some(b.as_slice()),
                    _ => None,
                };
                entries.push(EncodedEntry {
                    raw_bytes,
                    key,
                    value: v,
                });
            }
            entries.sort_by(EncodedEntry::cmp_key);
            if entries.windows(2).any(|w| w[0].key == w[1].key) {
                return Err(CborError::at_start(ErrorCode::DuplicateMapKey));
            }
            write_len(out, 5, entries.len());
            for entry in entries {
                out.extend_from_slice(&entry.key);
                write_canonical(out, entry.value)?;
            }
        }
        CborValue::Bool(false) => out.push(0xf4),
        CborValue::Bool(true) => out.push(0xf5),
        CborValue::Null => out.push(0xf6),
        CborValue::Undefined => out.push(0xf7),
        CborValue::Simple(v) => write_header(out, 7, u64::from(*v)),
        // Numbers and tags were consumed above.
        CborValue::Integer(_) | CborValue::Float(_) | CborValue::Tag(..) => {
            return Err(CborError::at_start(ErrorCode::CanonicalInvariant));
        }
    }
    Ok(())
}

fn write_number(out: &mut Vec<u8>, n: &CborNumber) {
    let wire = match n {
        CborNumber::Int64(v) => CborInteger::from(*v).to_wire(),
        CborNumber::BigInteger(b) => CborInteger::from_bigint(b.clone()).to_wire(),
        _ => None,
    };
    match wire {
        Some((negative, raw)) => write_header(out, u8::from(negative), raw),
        None => write_float64(out, n.to_f64()),
    }
}

/// Canonical numbers outside the integer range are always full-width float64 (`0xfb`), even when
/// a shorter width would hold the value.
fn write_float64(out: &mut Vec<u8>, f: f64) {
    out.push(0xfb);
    out.extend_from_slice(&f.to_bits().to_be_bytes());
}
