//! Shape predicates for tag payloads.
//!
//! A [`TypeFilter`] is an immutable value: every `with_*` builder returns a new filter. Once a
//! filter is [`TypeFilter::any`], builders return it unchanged.

use crate::{CborValue, MajorType};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ArrayShape {
    Exact(usize),
    AtLeast(usize),
    AnyLength,
}

/// Which major types, tags and array shapes a payload may have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    any: bool,
    types: u8,
    floating_point: bool,
    tags: Vec<u64>,
    array: ArrayShape,
    elements: Vec<TypeFilter>,
}

static ANY: TypeFilter = TypeFilter::any();
static NONE: TypeFilter = TypeFilter::none();

impl Default for TypeFilter {
    fn default() -> Self {
        Self::none()
    }
}

impl TypeFilter {
    /// Accepts every value.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            any: true,
            types: 0,
            floating_point: false,
            tags: Vec::new(),
            array: ArrayShape::AnyLength,
            elements: Vec::new(),
        }
    }

    /// Accepts nothing; the starting point for building a filter.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            any: false,
            types: 0,
            floating_point: false,
            tags: Vec::new(),
            array: ArrayShape::AnyLength,
            elements: Vec::new(),
        }
    }

    /// Non-negative integers.
    #[must_use]
    pub fn unsigned_integer() -> Self {
        Self::none().with_unsigned_integer()
    }

    /// Negative integers.
    #[must_use]
    pub fn negative_integer() -> Self {
        Self::none().with_negative_integer()
    }

    /// Integers of either sign.
    #[must_use]
    pub fn integer() -> Self {
        Self::unsigned_integer().with_negative_integer()
    }

    /// Byte strings.
    #[must_use]
    pub fn byte_string() -> Self {
        Self::none().with_byte_string()
    }

    /// Text strings.
    #[must_use]
    pub fn text_string() -> Self {
        Self::none().with_text_string()
    }

    /// Returns `true` iff this is the accept-everything filter.
    #[inline]
    #[must_use]
    pub const fn is_any(&self) -> bool {
        self.any
    }

    fn with_type(&self, major: MajorType) -> Self {
        if self.any {
            return self.clone();
        }
        let mut out = self.clone();
        out.types |= 1 << major.as_u8();
        out
    }

    /// Also accept non-negative integers.
    #[must_use]
    pub fn with_unsigned_integer(&self) -> Self {
        self.with_type(MajorType::UnsignedInt)
    }

    /// Also accept negative integers.
    #[must_use]
    pub fn with_negative_integer(&self) -> Self {
        self.with_type(MajorType::NegativeInt)
    }

    /// Also accept byte strings, including string references (tag 25).
    #[must_use]
    pub fn with_byte_string(&self) -> Self {
        self.with_type(MajorType::ByteString).with_tags(&[25])
    }

    /// Also accept text strings, including string references (tag 25).
    #[must_use]
    pub fn with_text_string(&self) -> Self {
        self.with_type(MajorType::TextString).with_tags(&[25])
    }

    /// Also accept maps.
    #[must_use]
    pub fn with_map(&self) -> Self {
        self.with_type(MajorType::Map)
    }

    /// Also accept floating-point numbers.
    #[must_use]
    pub fn with_floating_point(&self) -> Self {
        if self.any {
            return self.clone();
        }
        let mut out = self.with_type(MajorType::SimpleOrFloat);
        out.floating_point = true;
        out
    }

    /// Also accept payloads wrapped in any of `tags`.
    #[must_use]
    pub fn with_tags(&self, tags: &[u64]) -> Self {
        if self.any {
            return self.clone();
        }
        let mut out = self.clone();
        for tag in tags {
            if !out.tags.contains(tag) {
                out.tags.push(*tag);
            }
        }
        out
    }

    fn with_array(&self, shape: ArrayShape, elements: &[Self]) -> Self {
        if self.any {
            return self.clone();
        }
        let mut out = self.with_type(MajorType::Array);
        let keep = match shape {
            ArrayShape::Exact(n) => elements.len().min(n),
            ArrayShape::AtLeast(_) => elements.len(),
            ArrayShape::AnyLength => 0,
        };
        out.array = shape;
        out.elements = elements[..keep].to_vec();
        out
    }

    /// Also accept arrays of exactly `len` elements. `elements[i]` constrains position `i`; the
    /// last entry also covers any later positions. Entries beyond `len` are ignored.
    #[must_use]
    pub fn with_array_exact_length(&self, len: usize, elements: &[Self]) -> Self {
        self.with_array(ArrayShape::Exact(len), elements)
    }

    /// Also accept arrays of at least `len` elements, constrained like
    /// [`TypeFilter::with_array_exact_length`].
    #[must_use]
    pub fn with_array_min_length(&self, len: usize, elements: &[Self]) -> Self {
        self.with_array(ArrayShape::AtLeast(len), elements)
    }

    /// Also accept arrays of any length with unconstrained elements.
    #[must_use]
    pub fn with_array_any_length(&self) -> Self {
        self.with_array(ArrayShape::AnyLength, &[])
    }

    /// Returns `true` iff values of `major` are acceptable.
    #[must_use]
    pub const fn major_type_matches(&self, major: MajorType) -> bool {
        self.any || self.types & (1 << major.as_u8()) != 0
    }

    /// Returns `true` iff a payload may carry `tag`.
    #[must_use]
    pub fn tag_allowed(&self, tag: u64) -> bool {
        self.any || self.tags.contains(&tag)
    }

    /// Returns `true` iff an array of `len` elements is acceptable.
    #[must_use]
    pub const fn array_length_matches(&self, len: usize) -> bool {
        if self.any {
            return true;
        }
        if !self.major_type_matches(MajorType::Array) {
            return false;
        }
        match self.array {
            ArrayShape::Exact(n) => len == n,
            ArrayShape::AtLeast(n) => len >= n,
            ArrayShape::AnyLength => true,
        }
    }

    /// Returns `true` iff an array may have an element at `index`.
    #[must_use]
    pub const fn array_index_allowed(&self, index: usize) -> bool {
        if self.any {
            return true;
        }
        if !self.major_type_matches(MajorType::Array) {
            return false;
        }
        match self.array {
            ArrayShape::Exact(n) => index < n,
            ArrayShape::AtLeast(_) | ArrayShape::AnyLength => true,
        }
    }

    /// Returns `true` iff simple values other than floats (`true`, `null`, ...) are acceptable.
    #[must_use]
    pub const fn non_fp_simple_value_allowed(&self) -> bool {
        self.any || (self.major_type_matches(MajorType::SimpleOrFloat) && !self.floating_point)
    }

    /// The filter for the array element at `index`.
    ///
    /// Positions past an exact length get the reject-all filter; positions past a minimum length,
    /// and positions without a dedicated filter in an unconstrained array, get [`TypeFilter::any`].
    #[must_use]
    pub fn sub_filter(&self, index: usize) -> &Self {
        if self.any || self.array == ArrayShape::AnyLength {
            return &ANY;
        }
        match self.array {
            ArrayShape::Exact(n) if index >= n => return &NONE,
            ArrayShape::AtLeast(n) if index >= n && self.elements.is_empty() => return &ANY,
            _ => {}
        }
        match self.elements.get(index) {
            Some(f) => f,
            None => self.elements.last().unwrap_or(&ANY),
        }
    }

    /// Returns `true` iff `value` satisfies this filter, recursing into array elements.
    #[must_use]
    pub fn accepts(&self, value: &CborValue) -> bool {
        if self.any {
            return true;
        }
        // A tagged payload is the inner tag's business once the tag itself is allowed.
        match value {
            CborValue::Tag(tag, _) => self.tag_allowed(*tag),
            CborValue::Integer(i) => match i.to_wire() {
                Some((false, _)) => self.major_type_matches(MajorType::UnsignedInt),
                Some((true, _)) => self.major_type_matches(MajorType::NegativeInt),
                None => self.tag_allowed(if i.is_negative() { 3 } else { 2 }),
            },
            CborValue::Bytes(_) => self.major_type_matches(MajorType::ByteString),
            CborValue::Text(_) => self.major_type_matches(MajorType::TextString),
            CborValue::Map(_) => self.major_type_matches(MajorType::Map),
            CborValue::Array(items) => {
                self.array_length_matches(items.len())
                    && items
                        .iter()
                        .enumerate()
                        .all(|(i, item)| {
                            self.array_index_allowed(i) && self.sub_filter(i).accepts(item)
                        })
            }
            CborValue::Float(_) => {
                self.major_type_matches(MajorType::SimpleOrFloat) && self.floating_point
            }
            CborValue::Bool(_) | CborValue::Null | CborValue::Undefined | CborValue::Simple(_) => {
                self.non_fp_simple_value_allowed()
            }
        }
    }
}
