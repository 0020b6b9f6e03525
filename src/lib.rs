//! # cbor-canon
//!
//! A CBOR (RFC 8949) data-model codec with CTAP2-style canonical encoding, tag validation, a
//! numeric tower over every CBOR number representation, and JSON conversion.
//!
//! ## Overview
//!
//! - [`decode`] / [`encode`] convert between bytes and owned [`CborValue`] trees. Decoding accepts
//!   indefinite-length items, resolves stringref namespaces, and optionally resolves shared
//!   references. Limits in [`DecodeLimits`] are checked before allocation.
//! - [`canonical_encode`] produces the deterministic form that signature verifiers compare:
//!   tags dropped, integers in their shortest form, every other number as a float64, map keys
//!   sorted by [`cmp_canonical_keys`].
//! - [`CborNumber`] answers the same questions (sign, integrality, exact fit, narrowing) for
//!   machine integers, bignums, float32/float64, decimal fractions, bigfloats and rationals.
//! - [`TagRegistry`] validates tag payloads against a [`TypeFilter`] and normalizes them
//!   (bignums to integers, rationals with denominator one to integers, and so on).
//! - [`json`] reads JSON text in any Unicode encoding form and writes UTF-8 JSON.
//!
//! ## Errors
//!
//! Every fallible operation returns [`CborError`], a `Copy` pair of an [`ErrorCode`] and an
//! offset. [`ErrorCode::kind`] classifies the code: malformed input, numeric overflow, caller
//! argument errors, or internal failures.
//!
//! ## Feature flags
//!
//! - `sha2` *(default)*: SHA-256 of canonical bytes ([`CanonicalCbor::sha256`]).
//! - `serde`: `Serialize`/`Deserialize` for [`CborValue`].
//! - `simdutf8`: SIMD-accelerated UTF-8 validation where supported.
//!
//! ## Logging
//!
//! Rejections are reported through the `log` facade at `debug` level, reference-table lookups at
//! `trace`. The crate never installs a logger.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod alloc_util;
mod canonical;
mod decode;
mod encode;
mod error;
mod filter;
mod float;
pub mod json;
mod limits;
pub mod number;
mod options;
mod record;
mod refs;
#[cfg(feature = "serde")]
mod serde_impl;
pub mod tags;
pub mod text;
mod value;
mod wire;

pub use crate::canonical::{canonical_encode, cmp_canonical_keys, CanonicalCbor};
pub use crate::decode::{
    decode, decode_range, decode_reader, decode_sequence, decode_with_registry,
};
pub use crate::encode::{encode, encode_into, encode_to_writer, INDEF_CHUNK_LEN};
pub use crate::error::{check_range, CborError, ErrorCode, ErrorKind};
pub use crate::filter::TypeFilter;
pub use crate::float::{shortest_width, FloatWidth};
pub use crate::limits::{DecodeLimits, DEFAULT_MAX_CONTAINER_LEN, DEFAULT_MAX_DEPTH, JSON_MAX_DEPTH};
pub use crate::number::{BigDecimal, BigFloat, CborNumber, Sign};
pub use crate::options::{CborOptions, JsonOptions, NumberConversion};
pub use crate::record::{ConverterRegistry, FromCborMap, RecordFields, ToCborMap};
pub use crate::refs::{min_stringref_len, SharedRefs, StringRefs};
pub use crate::tags::{DateTimeFields, GenericTag, TagHandler, TagRegistry, UnsignedTag, Uuid};
pub use crate::value::{CborInteger, CborMap, CborValue, MajorType};

pub use num_bigint::BigInt;
pub use num_rational::BigRational;
