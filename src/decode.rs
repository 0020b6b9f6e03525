//! RFC 8949 decoder producing owned values.
//!
//! The decoder is recursive; every container and tag level counts against
//! [`DecodeLimits::max_depth`], and lengths are checked against the limits before anything is
//! allocated for them.

use std::io::Read;

use log::{debug, trace};

use crate::alloc_util::{try_reserve, try_vec_from_slice, try_vec_with_capacity};
use crate::error::check_range;
use crate::float::{f16_to_f64, f32_to_f64};
use crate::options::CborOptions;
use crate::refs::{SharedRefs, StringRefs};
use crate::tags::{bignum, TagRegistry};
use crate::text::utf8;
use crate::wire::{len_to_usize, Cursor, AI_INDEFINITE, BREAK};
use crate::{CborError, CborInteger, CborMap, CborValue, DecodeLimits, ErrorCode};

const TAG_SHAREABLE: u64 = 28;
const TAG_SHAREDREF: u64 = 29;
const TAG_STRINGREF: u64 = 25;
const TAG_STRINGREF_NAMESPACE: u64 = 256;

struct Decoder<'a, 'o> {
    cur: Cursor<'a>,
    options: &'o CborOptions,
    limits: DecodeLimits,
    shared: SharedRefs,
    strings: StringRefs,
    registry: Option<&'o TagRegistry>,
}

impl<'a, 'o> Decoder<'a, 'o> {
    fn new(data: &'a [u8], options: &'o CborOptions, limits: DecodeLimits) -> Self {
        Self {
            cur: Cursor::new(data),
            options,
            limits,
            shared: SharedRefs::new(),
            strings: StringRefs::new(),
            registry: None,
        }
    }

    fn with_registry(mut self, registry: &'o TagRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    const fn ensure_depth(&self, depth: usize, off: usize) -> Result<(), CborError> {
        if depth > self.limits.max_depth {
            return Err(CborError::new(ErrorCode::DepthLimitExceeded, off));
        }
        Ok(())
    }

    const fn enforce_len(len: usize, max_len: usize, off: usize) -> Result<(), CborError> {
        if len > max_len {
            return Err(CborError::new(ErrorCode::LengthLimitExceeded, off));
        }
        Ok(())
    }

    /// Consume a break code if one is next.
    fn at_break(&mut self) -> Result<bool, CborError> {
        if self.cur.peek_u8()? == BREAK {
            self.cur.read_u8()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn decode_item(&mut self, depth: usize) -> Result<CborValue, CborError> {
        let off = self.cur.position();
        let ib = self.cur.read_u8()?;
        if ib == BREAK {
            return Err(CborError::new(ErrorCode::UnexpectedBreak, off));
        }
        let major = ib >> 5;
        let ai = ib & 0x1f;
        match major {
            0 | 1 => {
                let raw = self.cur.read_uint_arg(ai, off)?;
                Ok(CborValue::Integer(CborInteger::from_wire(major == 1, raw)))
            }
            2 | 3 => self.decode_string(major, ai, off),
            4 => self.decode_array(ai, off, depth),
            5 => self.decode_map(ai, off, depth),
            6 => {
                let tag = self.cur.read_uint_arg(ai, off)?;
                self.decode_tag(tag, off, depth)
            }
            _ => self.decode_simple(ai, off),
        }
    }

    fn read_chunk(&mut self, major: u8, ai: u8, off: usize) -> Result<&'a [u8], CborError> {
        let len = len_to_usize(self.cur.read_uint_arg(ai, off)?, off)?;
        let max = if major == 2 {
            self.limits.max_bytes_len
        } else {
            self.limits.max_text_len
        };
        Self::enforce_len(len, max, off)?;
        self.cur.read_exact(len)
    }

    fn decode_string(&mut self, major: u8, ai: u8, off: usize) -> Result<CborValue, CborError> {
        if ai != AI_INDEFINITE {
            let data_off = self.cur.position();
            let bytes = self.read_chunk(major, ai, off)?;
            let value = if major == 2 {
                CborValue::Bytes(try_vec_from_slice(bytes, data_off)?)
            } else {
                CborValue::Text(utf8::validate(bytes, data_off)?.to_owned())
            };
            self.strings.add_string_if_needed(&value, bytes.len());
            return Ok(value);
        }

        let mut buf: Vec<u8> = Vec::new();
        while !self.at_break()? {
            let chunk_off = self.cur.position();
            let ib = self.cur.read_u8()?;
            if ib >> 5 != major || ib & 0x1f == AI_INDEFINITE {
                return Err(CborError::new(ErrorCode::InvalidIndefiniteLength, chunk_off));
            }
            let data_off = self.cur.position();
            let chunk = self.read_chunk(major, ib & 0x1f, chunk_off)?;
            if major == 3 {
                utf8::validate(chunk, data_off)?;
            }
            let total = buf
                .len()
                .checked_add(chunk.len())
                .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, chunk_off))?;
            let max = if major == 2 {
                self.limits.max_bytes_len
            } else {
                self.limits.max_text_len
            };
            Self::enforce_len(total, max, chunk_off)?;
            try_reserve(&mut buf, chunk.len(), chunk_off)?;
            buf.extend_from_slice(chunk);
        }
        if major == 2 {
            return Ok(CborValue::Bytes(buf));
        }
        // Each chunk was validated on its own, so the concatenation is valid UTF-8.
        String::from_utf8(buf)
            .map(CborValue::Text)
            .map_err(|_| CborError::new(ErrorCode::Utf8Invalid, off))
    }

    fn decode_array(&mut self, ai: u8, off: usize, depth: usize) -> Result<CborValue, CborError> {
        self.ensure_depth(depth + 1, off)?;
        match self.cur.read_argument(ai, off)? {
            Some(n) => {
                let len = len_to_usize(n, off)?;
                Self::enforce_len(len, self.limits.max_array_len, off)?;
                let mut items = try_vec_with_capacity(len, self.cur.remaining(), off)?;
                for _ in 0..len {
                    items.push(self.decode_item(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
            None => {
                let mut items = Vec::new();
                while !self.at_break()? {
                    Self::enforce_len(items.len() + 1, self.limits.max_array_len, off)?;
                    items.push(self.decode_item(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
        }
    }

    fn decode_entry(&mut self, map: &mut CborMap, depth: usize) -> Result<(), CborError> {
        let key_off = self.cur.position();
        let key = self.decode_item(depth)?;
        let value = self.decode_item(depth)?;
        if map.contains_key(&key) && !self.options.allow_duplicate_keys {
            return Err(CborError::new(ErrorCode::DuplicateMapKey, key_off));
        }
        map.insert(key, value);
        Ok(())
    }

    fn decode_map(&mut self, ai: u8, off: usize, depth: usize) -> Result<CborValue, CborError> {
        self.ensure_depth(depth + 1, off)?;
        match self.cur.read_argument(ai, off)? {
            Some(n) => {
                let len = len_to_usize(n, off)?;
                Self::enforce_len(len, self.limits.max_map_len, off)?;
                // Each entry needs at least two bytes of input.
                let mut map = CborMap::with_capacity(len.min(self.cur.remaining() / 2));
                for _ in 0..len {
                    self.decode_entry(&mut map, depth + 1)?;
                }
                Ok(CborValue::Map(map))
            }
            None => {
                let mut map = CborMap::new();
                let mut pairs = 0usize;
                while !self.at_break()? {
                    pairs += 1;
                    Self::enforce_len(pairs, self.limits.max_map_len, off)?;
                    self.decode_entry(&mut map, depth + 1)?;
                }
                Ok(CborValue::Map(map))
            }
        }
    }

    /// Read the integer index operand of a reference tag.
    fn reference_index(&mut self, depth: usize, off: usize) -> Result<i64, CborError> {
        match self.decode_item(depth)? {
            CborValue::Integer(i) => Ok(i
                .as_i64()
                .unwrap_or(if i.is_negative() { -1 } else { i64::MAX })),
            _ => Err(CborError::new(ErrorCode::ReferenceNegative, off)),
        }
    }

    fn decode_tag(&mut self, tag: u64, off: usize, depth: usize) -> Result<CborValue, CborError> {
        self.ensure_depth(depth + 1, off)?;
        let at = |e: CborError| CborError::new(e.code, off);
        match tag {
            TAG_STRINGREF_NAMESPACE => {
                self.strings.push();
                let inner = self.decode_item(depth + 1);
                self.strings.pop();
                inner
            }
            TAG_STRINGREF if self.strings.in_namespace() => {
                let index = self.reference_index(depth + 1, off)?;
                trace!("stringref {index} at byte {off}");
                self.strings.get_string(index).map_err(at)
            }
            TAG_SHAREABLE if self.options.resolve_references => {
                let slot = self.shared.reserve();
                let inner = self.decode_item(depth + 1)?;
                self.shared.fill(slot, inner.clone());
                Ok(inner)
            }
            TAG_SHAREDREF if self.options.resolve_references => {
                let index = self.reference_index(depth + 1, off)?;
                trace!("sharedref {index} at byte {off}");
                self.shared.get_object(index).map_err(at)
            }
            _ => {
                let inner = self.decode_item(depth + 1)?;
                let tagged = CborValue::Tag(tag, Box::new(inner));
                match self.registry {
                    Some(registry) => registry.validate(&tagged).map_err(at),
                    None if matches!(tag, 2 | 3) => bignum::decode(&tagged).map_err(at),
                    None => Ok(tagged),
                }
            }
        }
    }

    fn decode_simple(&mut self, ai: u8, off: usize) -> Result<CborValue, CborError> {
        match ai {
            0..=19 => Ok(CborValue::Simple(ai)),
            20 => Ok(CborValue::Bool(false)),
            21 => Ok(CborValue::Bool(true)),
            22 => Ok(CborValue::Null),
            23 => Ok(CborValue::Undefined),
            24 => {
                let v = self.cur.read_u8()?;
                if v < 32 {
                    return Err(CborError::new(ErrorCode::InvalidSimpleValue, off));
                }
                Ok(CborValue::Simple(v))
            }
            25 => Ok(CborValue::Float(f16_to_f64(self.cur.read_be_u16()?))),
            26 => Ok(CborValue::Float(f32_to_f64(self.cur.read_be_u32()?))),
            27 => Ok(CborValue::Float(f64::from_bits(self.cur.read_be_u64()?))),
            28..=30 => Err(CborError::new(ErrorCode::ReservedAdditionalInfo, off)),
            _ => Err(CborError::new(ErrorCode::UnexpectedBreak, off)),
        }
    }
}

fn log_rejection(e: CborError) -> CborError {
    debug!("cbor decode rejected: {:?} at byte {}", e.code, e.offset);
    e
}

fn decode_whole(mut dec: Decoder<'_, '_>) -> Result<CborValue, CborError> {
    let value = dec.decode_item(0).map_err(log_rejection)?;
    if !dec.cur.is_empty() {
        return Err(log_rejection(CborError::new(
            ErrorCode::TrailingBytes,
            dec.cur.position(),
        )));
    }
    Ok(value)
}

/// Decode exactly one CBOR item from `bytes`.
///
/// Tag 2/3 bignums become integers, stringref namespaces (tags 256/25) are always resolved, and
/// sharedrefs (tags 28/29) are resolved when `options.resolve_references` is set. Indefinite-length
/// strings, arrays and maps are accepted. Other tags are kept as they are; use
/// [`decode_with_registry`] to validate them.
///
/// # Errors
///
/// A malformed-input error at the byte offset of the offending item, `TrailingBytes` if anything
/// follows the item, or a limit error. A tag 2/3 whose payload is not a byte string fails with
/// `TagPayloadType` at the tag.
pub fn decode(
    bytes: &[u8],
    options: &CborOptions,
    limits: DecodeLimits,
) -> Result<CborValue, CborError> {
    decode_whole(Decoder::new(bytes, options, limits))
}

/// Decode exactly one CBOR item from `bytes`, running every decoded tag through `registry`.
///
/// Tags are validated innermost first, as soon as their payload is complete, and each is replaced
/// by the handler's normalized value. Resolved reference tags (25, 28, 29, 256) never reach the
/// registry.
///
/// # Errors
///
/// As for [`decode`]; a tag the registry rejects fails with the handler's error code at the byte
/// offset of the tag.
pub fn decode_with_registry(
    bytes: &[u8],
    options: &CborOptions,
    limits: DecodeLimits,
    registry: &TagRegistry,
) -> Result<CborValue, CborError> {
    decode_whole(Decoder::new(bytes, options, limits).with_registry(registry))
}

/// Decode exactly one CBOR item from `bytes[offset..offset + len]`.
///
/// Error offsets are relative to the start of `bytes`.
///
/// # Errors
///
/// `ArgumentOutOfRange` before any decoding if the window does not lie inside `bytes`; otherwise
/// as for [`decode`].
pub fn decode_range(
    bytes: &[u8],
    offset: usize,
    len: usize,
    options: &CborOptions,
    limits: DecodeLimits,
) -> Result<CborValue, CborError> {
    check_range(bytes.len(), offset, len)?;
    decode(&bytes[offset..offset + len], options, limits)
        .map_err(|e| CborError::new(e.code, e.offset + offset))
}

/// Decode a CBOR sequence (RFC 8742): zero or more items back to back.
///
/// Reference tables do not carry over from one item to the next.
///
/// # Errors
///
/// As for [`decode`], for the first item that fails.
pub fn decode_sequence(
    bytes: &[u8],
    options: &CborOptions,
    limits: DecodeLimits,
) -> Result<Vec<CborValue>, CborError> {
    let mut out = Vec::new();
    let mut cur = Cursor::new(bytes);
    while !cur.is_empty() {
        let mut dec = Decoder::new(bytes, options, limits);
        dec.cur = cur;
        out.push(dec.decode_item(0).map_err(log_rejection)?);
        cur = dec.cur;
    }
    Ok(out)
}

/// Read a byte stream to its end and decode it as one CBOR item.
///
/// # Errors
///
/// `IoFailure` if the reader fails, otherwise as for [`decode`].
pub fn decode_reader<R: Read>(
    mut reader: R,
    options: &CborOptions,
    limits: DecodeLimits,
) -> Result<CborValue, CborError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes, options, limits)
}
