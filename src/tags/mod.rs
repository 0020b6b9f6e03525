//! Tag registry: payload filters plus validating conversions per tag number.
//!
//! Each [`TagHandler`] owns a [`TypeFilter`] for its payload and a conversion that runs once the
//! filter has accepted the payload. Unregistered tags use [`GenericTag`], which accepts anything.

pub mod bignum;
pub mod date;
pub mod fraction;
pub mod rational;
pub mod uri;
pub mod uuid;

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::number::CborNumber;
use crate::{CborError, CborValue, ErrorCode, TypeFilter};

pub use date::DateTimeFields;
pub use uuid::Uuid;

/// Validation and normalization for one or more tag numbers.
pub trait TagHandler: Send + Sync {
    /// Shapes the payload may take.
    fn type_filter(&self) -> TypeFilter;

    /// Validate an accepted payload and return the normalized value, which may be untagged (a
    /// bignum becomes an integer, a rational with denominator one becomes its numerator).
    ///
    /// # Errors
    ///
    /// A malformed-input error naming the violated expectation.
    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError>;
}

fn keep(tag: u64, payload: &CborValue) -> CborValue {
    CborValue::tagged(tag, payload.clone())
}

/// Accepts any payload unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericTag;

impl TagHandler for GenericTag {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::any()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        Ok(keep(tag, payload))
    }
}

/// Requires a non-negative integer that fits 64 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedTag;

impl TagHandler for UnsignedTag {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::unsigned_integer()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        match payload {
            CborValue::Integer(i) if i.as_u64().is_some() => Ok(keep(tag, payload)),
            _ => Err(CborError::at_start(ErrorCode::TagPayloadType)),
        }
    }
}

struct DateString;

impl TagHandler for DateString {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::text_string()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        let text = payload
            .as_text()
            .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
        DateTimeFields::parse(text)?;
        Ok(keep(tag, payload))
    }
}

struct EpochSeconds;

impl TagHandler for EpochSeconds {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::integer()
            .with_floating_point()
            .with_tags(&[2, 3, 4, 5])
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        let n = CborNumber::from_value(payload)
            .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
        if !n.is_finite() {
            return Err(CborError::at_start(ErrorCode::TagPayloadType));
        }
        Ok(keep(tag, payload))
    }
}

struct Bignum;

impl TagHandler for Bignum {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::byte_string()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        bignum::decode(&keep(tag, payload))
    }
}

struct Fraction {
    extended: bool,
}

impl TagHandler for Fraction {
    fn type_filter(&self) -> TypeFilter {
        let mantissa = TypeFilter::integer().with_tags(&[2, 3]);
        let exponent = if self.extended {
            mantissa.clone()
        } else {
            TypeFilter::integer()
        };
        TypeFilter::none().with_array_exact_length(2, &[exponent, mantissa])
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        fraction::normalize(tag, payload)
    }
}

struct ObjectType;

impl TagHandler for ObjectType {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::none().with_array_min_length(1, &[TypeFilter::any()])
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        Ok(keep(tag, payload))
    }
}

struct Rational;

impl TagHandler for Rational {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::none().with_array_exact_length(
            2,
            &[
                TypeFilter::integer().with_tags(&[2, 3]),
                TypeFilter::unsigned_integer().with_tags(&[2]),
            ],
        )
    }

    fn convert(&self, _tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        rational::normalize(payload)
    }
}

struct Iri;

impl TagHandler for Iri {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::text_string()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        let text = payload
            .as_text()
            .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
        uri::validate(text)?;
        Ok(keep(tag, payload))
    }
}

struct UuidTag;

impl TagHandler for UuidTag {
    fn type_filter(&self) -> TypeFilter {
        TypeFilter::byte_string()
    }

    fn convert(&self, tag: u64, payload: &CborValue) -> Result<CborValue, CborError> {
        let bytes = payload
            .as_bytes()
            .ok_or_else(|| CborError::at_start(ErrorCode::TagPayloadType))?;
        Uuid::from_slice(bytes)?;
        Ok(keep(tag, payload))
    }
}

/// Tag number to handler map.
#[derive(Clone)]
pub struct TagRegistry {
    handlers: HashMap<u64, Arc<dyn TagHandler>>,
}

impl core::fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut tags: Vec<_> = self.handlers.keys().collect();
        tags.sort_unstable();
        f.debug_struct("TagRegistry").field("tags", &tags).finish()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TagRegistry {
    /// A registry with no handlers; every tag is generic.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry with handlers for tags 0-5, 21-23, 26, 27, 30, 32, 37, 264 and 265.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut reg = Self::empty();
        reg.register(0, DateString);
        reg.register(1, EpochSeconds);
        reg.register(2, Bignum);
        reg.register(3, Bignum);
        reg.register(4, Fraction { extended: false });
        reg.register(5, Fraction { extended: false });
        // Expected JSON conversions (base64url, base64, base16) are hints only.
        for tag in 21..=23 {
            reg.register(tag, GenericTag);
        }
        reg.register(26, ObjectType);
        reg.register(27, ObjectType);
        reg.register(30, Rational);
        reg.register(32, Iri);
        reg.register(37, UuidTag);
        reg.register(264, Fraction { extended: true });
        reg.register(265, Fraction { extended: true });
        reg
    }

    /// Add or replace the handler for `tag`.
    pub fn register(&mut self, tag: u64, handler: impl TagHandler + 'static) {
        self.handlers.insert(tag, Arc::new(handler));
    }

    /// Returns `true` iff `tag` has a dedicated handler.
    #[must_use]
    pub fn is_registered(&self, tag: u64) -> bool {
        self.handlers.contains_key(&tag)
    }

    /// The handler for `tag`, or [`GenericTag`].
    #[must_use]
    pub fn handler(&self, tag: u64) -> &dyn TagHandler {
        match self.handlers.get(&tag) {
            Some(h) => h.as_ref(),
            None => &GenericTag,
        }
    }

    /// Validate and normalize the outermost tag of `value`. Untagged values pass unchanged.
    ///
    /// # Errors
    ///
    /// `TagPayloadType` if the payload fails the tag's filter, otherwise the handler's error.
    pub fn validate(&self, value: &CborValue) -> Result<CborValue, CborError> {
        let CborValue::Tag(tag, payload) = value else {
            return Ok(value.clone());
        };
        let handler = self.handler(*tag);
        if !handler.type_filter().accepts(payload) {
            debug!("tag {tag}: payload rejected by type filter");
            return Err(CborError::at_start(ErrorCode::TagPayloadType));
        }
        handler.convert(*tag, payload).map_err(|e| {
            debug!("tag {tag}: {e}");
            e
        })
    }

    /// Validate every tag in `value`, innermost first, returning the normalized tree.
    ///
    /// # Errors
    ///
    /// The first validation error encountered.
    pub fn validate_deep(&self, value: &CborValue) -> Result<CborValue, CborError> {
        match value {
            CborValue::Array(items) => Ok(CborValue::Array(
                items
                    .iter()
                    .map(|v| self.validate_deep(v))
                    .collect::<Result<_, _>>()?,
            )),
            CborValue::Map(map) => {
                let mut out = crate::CborMap::with_capacity(map.len());
                for (k, v) in map.iter() {
                    out.insert(self.validate_deep(k)?, self.validate_deep(v)?);
                }
                Ok(CborValue::Map(out))
            }
            CborValue::Tag(tag, payload) => {
                let inner = self.validate_deep(payload)?;
                self.validate(&CborValue::Tag(*tag, Box::new(inner)))
            }
            other => Ok(other.clone()),
        }
    }
}
