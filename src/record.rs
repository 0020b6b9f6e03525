//! Host-type converters and the record mapping boundary.
//!
//! [`ConverterRegistry`] associates a Rust type with a CBOR tag and a pair of conversion
//! functions, looked up by exact type identity. [`ToCborMap`] / [`FromCborMap`] are the capability
//! traits a record type implements to map itself to and from a CBOR map with text keys;
//! [`RecordFields`] does the field lookups for `FromCborMap` implementations.

use core::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::{CborError, CborMap, CborValue, ErrorCode};

type ToFn = Box<dyn Fn(&dyn Any) -> Result<CborValue, CborError> + Send + Sync>;
type FromFn = Box<dyn Fn(&CborValue) -> Result<Box<dyn Any>, CborError> + Send + Sync>;

struct Converter {
    tag: u64,
    type_name: &'static str,
    to_cbor: ToFn,
    from_cbor: FromFn,
}

/// Tagged converters for host types, keyed by [`TypeId`].
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Converter>,
}

impl ConverterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the converter for `T`.
    ///
    /// `to_cbor` produces the tag payload; `from_cbor` receives the payload with the tag removed.
    pub fn register<T, F, G>(&mut self, tag: u64, to_cbor: F, from_cbor: G)
    where
        T: Any,
        F: Fn(&T) -> Result<CborValue, CborError> + Send + Sync + 'static,
        G: Fn(&CborValue) -> Result<T, CborError> + Send + Sync + 'static,
    {
        let to: ToFn = Box::new(move |any: &dyn Any| {
            any.downcast_ref::<T>()
                .ok_or_else(|| CborError::at_start(ErrorCode::ConverterMissing))
                .and_then(&to_cbor)
        });
        let from: FromFn =
            Box::new(move |value: &CborValue| from_cbor(value).map(|v| Box::new(v) as Box<dyn Any>));
        self.converters.insert(
            TypeId::of::<T>(),
            Converter {
                tag,
                type_name: core::any::type_name::<T>(),
                to_cbor: to,
                from_cbor: from,
            },
        );
    }

    /// Returns `true` iff a converter for `T` is registered.
    #[must_use]
    pub fn is_registered<T: Any>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    /// The tag registered for `T`.
    #[must_use]
    pub fn tag_for<T: Any>(&self) -> Option<u64> {
        self.converters.get(&TypeId::of::<T>()).map(|c| c.tag)
    }

    fn converter<T: Any>(&self) -> Result<&Converter, CborError> {
        self.converters.get(&TypeId::of::<T>()).ok_or_else(|| {
            debug!("no converter for {}", core::any::type_name::<T>());
            CborError::at_start(ErrorCode::ConverterMissing)
        })
    }

    /// Convert `value` to its tagged CBOR form.
    ///
    /// # Errors
    ///
    /// `ConverterMissing` if `T` has no converter, or the converter's own error.
    pub fn to_cbor<T: Any>(&self, value: &T) -> Result<CborValue, CborError> {
        let conv = self.converter::<T>()?;
        let payload = (conv.to_cbor)(value)?;
        Ok(payload.with_tag(conv.tag))
    }

    /// Convert a tagged CBOR value back to `T`.
    ///
    /// # Errors
    ///
    /// `ConverterMissing` if `T` has no converter, `TagPayloadType` if the outermost tag is not
    /// the one registered for `T`, or the converter's own error.
    pub fn from_cbor<T: Any>(&self, value: &CborValue) -> Result<T, CborError> {
        let conv = self.converter::<T>()?;
        let payload = match value {
            CborValue::Tag(tag, payload) if *tag == conv.tag => payload,
            _ => {
                debug!(
                    "{}: expected tag {}, found {:?}",
                    conv.type_name,
                    conv.tag,
                    value.most_outer_tag()
                );
                return Err(CborError::at_start(ErrorCode::TagPayloadType));
            }
        };
        let boxed = (conv.from_cbor)(payload)?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| CborError::at_start(ErrorCode::ConverterMissing))
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .converters
            .values()
            .map(|c| (c.type_name, c.tag))
            .collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}

/// A record that can write itself as a CBOR map.
pub trait ToCborMap {
    /// The fields of `self` as a text-keyed map.
    fn to_cbor_map(&self) -> CborMap;

    /// The record as a CBOR value.
    fn to_cbor_value(&self) -> CborValue {
        CborValue::Map(self.to_cbor_map())
    }
}

/// A record that can be built from a CBOR map.
pub trait FromCborMap: Sized {
    /// Build the record from its fields.
    ///
    /// # Errors
    ///
    /// `RecordField` if a required field is missing or has the wrong type.
    fn from_cbor_map(map: &CborMap) -> Result<Self, CborError>;

    /// Build the record from a CBOR value, which must be a map.
    ///
    /// # Errors
    ///
    /// `RecordField` if `value` is not a map, otherwise as for [`FromCborMap::from_cbor_map`].
    fn from_cbor_value(value: &CborValue) -> Result<Self, CborError> {
        RecordFields::from_value(value).and_then(|fields| Self::from_cbor_map(fields.map))
    }
}

/// Field access over a text-keyed map.
#[derive(Debug, Clone, Copy)]
pub struct RecordFields<'a> {
    map: &'a CborMap,
}

fn field_error(name: &str) -> CborError {
    debug!("record field {name:?} missing or mistyped");
    CborError::at_start(ErrorCode::RecordField)
}

impl<'a> RecordFields<'a> {
    /// Wrap a map.
    #[must_use]
    pub const fn new(map: &'a CborMap) -> Self {
        Self { map }
    }

    /// Wrap a value that must be an (untagged) map.
    ///
    /// # Errors
    ///
    /// `RecordField` if `value` is not a map.
    pub fn from_value(value: &'a CborValue) -> Result<Self, CborError> {
        value
            .as_map()
            .map(Self::new)
            .ok_or_else(|| CborError::at_start(ErrorCode::RecordField))
    }

    /// The field `name`, if present.
    #[must_use]
    pub fn optional(&self, name: &str) -> Option<&'a CborValue> {
        self.map.get_text(name)
    }

    /// The field `name`.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent.
    pub fn required(&self, name: &str) -> Result<&'a CborValue, CborError> {
        self.optional(name).ok_or_else(|| field_error(name))
    }

    /// The field `name` converted by `f`; a `None` from `f` counts as a type mismatch.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent or `f` rejects it.
    pub fn required_as<T>(
        &self,
        name: &str,
        f: impl FnOnce(&'a CborValue) -> Option<T>,
    ) -> Result<T, CborError> {
        self.required(name).and_then(|v| f(v).ok_or_else(|| field_error(name)))
    }

    /// A required text field.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent or not a text string.
    pub fn text(&self, name: &str) -> Result<&'a str, CborError> {
        self.required_as(name, CborValue::as_text)
    }

    /// A required integer field that fits `i64`.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent, not an integer, or out of `i64` range.
    pub fn i64(&self, name: &str) -> Result<i64, CborError> {
        self.required_as(name, |v| v.as_integer().and_then(crate::CborInteger::as_i64))
    }

    /// A required boolean field.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent or not a boolean.
    pub fn bool(&self, name: &str) -> Result<bool, CborError> {
        self.required_as(name, CborValue::as_bool)
    }

    /// A required byte-string field.
    ///
    /// # Errors
    ///
    /// `RecordField` if the field is absent or not a byte string.
    pub fn bytes(&self, name: &str) -> Result<&'a [u8], CborError> {
        self.required_as(name, CborValue::as_bytes)
    }
}
