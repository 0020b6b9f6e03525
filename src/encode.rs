//! RFC 8949 encoder for owned values.

use std::io::Write;

use crate::alloc_util::try_reserve;
use crate::canonical::canonical_encode;
use crate::float::{shortest_width, FloatWidth};
use crate::options::CborOptions;
use crate::tags::bignum;
use crate::wire::{write_header, write_len, AI_INDEFINITE, BREAK};
use crate::{CborError, CborValue};

/// Strings longer than this are chunked when indefinite-length strings are enabled.
pub const INDEF_CHUNK_LEN: usize = 1024;

struct Encoder<'o> {
    out: Vec<u8>,
    options: &'o CborOptions,
}

impl Encoder<'_> {
    #[inline]
    fn reserve(&mut self, additional: usize) -> Result<(), CborError> {
        let offset = self.out.len();
        try_reserve(&mut self.out, additional, offset)
    }

    fn write_string(&mut self, major: u8, bytes: &[u8], text: bool) -> Result<(), CborError> {
        if self.options.use_indef_length_strings && bytes.len() > INDEF_CHUNK_LEN {
            self.out.push((major << 5) | AI_INDEFINITE);
            let mut start = 0;
            while start < bytes.len() {
                let end = chunk_end(bytes, start, text);
                self.reserve(end - start + 9)?;
                write_len(&mut self.out, major, end - start);
                self.out.extend_from_slice(&bytes[start..end]);
                start = end;
            }
            self.out.push(BREAK);
            return Ok(());
        }
        self.reserve(bytes.len() + 9)?;
        write_len(&mut self.out, major, bytes.len());
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    fn write_float(&mut self, f: f64) {
        match shortest_width(f) {
            FloatWidth::Half(bits) => {
                self.out.push(0xf9);
                self.out.extend_from_slice(&bits.to_be_bytes());
            }
            FloatWidth::Single(bits) => {
                self.out.push(0xfa);
                self.out.extend_from_slice(&bits.to_be_bytes());
            }
            FloatWidth::Double(bits) => {
                self.out.push(0xfb);
                self.out.extend_from_slice(&bits.to_be_bytes());
            }
        }
    }

    fn write_value(&mut self, value: &CborValue) -> Result<(), CborError> {
        self.reserve(9)?;
        match value {
            CborValue::Integer(i) => match i.to_wire() {
                Some((negative, raw)) => write_header(&mut self.out, u8::from(negative), raw),
                None => return self.write_value(&bignum::encode(i)),
            },
            CborValue::Bytes(b) => self.write_string(2, b, false)?,
            CborValue::Text(s) => self.write_string(3, s.as_bytes(), true)?,
            CborValue::Array(items) => {
                write_len(&mut self.out, 4, items.len());
                for item in items {
                    self.write_value(item)?;
                }
            }
            CborValue::Map(map) => {
                write_len(&mut self.out, 5, map.len());
                for (k, v) in map.iter() {
                    self.write_value(k)?;
                    self.write_value(v)?;
                }
            }
            CborValue::Tag(tag, inner) => {
                write_header(&mut self.out, 6, *tag);
                self.write_value(inner)?;
            }
            CborValue::Bool(false) => self.out.push(0xf4),
            CborValue::Bool(true) => self.out.push(0xf5),
            CborValue::Null => self.out.push(0xf6),
            CborValue::Undefined => self.out.push(0xf7),
            CborValue::Simple(v) => write_header(&mut self.out, 7, u64::from(*v)),
            CborValue::Float(f) => self.write_float(*f),
        }
        Ok(())
    }
}

/// End of the chunk starting at `start`: at most `INDEF_CHUNK_LEN` bytes, on a character
/// boundary for text.
fn chunk_end(bytes: &[u8], start: usize, text: bool) -> usize {
    let mut end = (start + INDEF_CHUNK_LEN).min(bytes.len());
    if text {
        // UTF-8 continuation bytes are 0b10xx_xxxx.
        while end < bytes.len() && end > start && bytes[end] & 0xc0 == 0x80 {
            end -= 1;
        }
    }
    end
}

/// Encode `value` as a single CBOR item.
///
/// Map entries are written in insertion order, floats in the narrowest width that keeps their
/// exact bits, and integers outside `[-2^64, 2^64-1]` as tag 2/3 bignums. With
/// `ctap2_canonical` set the output is [`canonical_encode`]'s instead.
///
/// # Errors
///
/// `AllocationFailed` if the output buffer cannot grow, `CanonicalInvariant` from the canonical
/// encoder.
pub fn encode(value: &CborValue, options: &CborOptions) -> Result<Vec<u8>, CborError> {
    if options.ctap2_canonical {
        return canonical_encode(value).map(Into::into);
    }
    let mut enc = Encoder {
        out: Vec::new(),
        options,
    };
    enc.write_value(value)?;
    Ok(enc.out)
}

/// Encode `value` and append it to `out`.
///
/// # Errors
///
/// As for [`encode`].
pub fn encode_into(value: &CborValue, options: &CborOptions, out: &mut Vec<u8>) -> Result<(), CborError> {
    let bytes = encode(value, options)?;
    let offset = out.len();
    try_reserve(out, bytes.len(), offset)?;
    out.extend_from_slice(&bytes);
    Ok(())
}

/// Encode `value` to a byte stream.
///
/// # Errors
///
/// As for [`encode`], plus `IoFailure` if the writer fails.
pub fn encode_to_writer<W: Write>(
    value: &CborValue,
    options: &CborOptions,
    mut writer: W,
) -> Result<(), CborError> {
    let bytes = encode(value, options)?;
    writer.write_all(&bytes)?;
    Ok(())
}
