use core::hash::{Hash, Hasher};

use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

/// The eight CBOR major types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MajorType {
    /// Major type 0.
    UnsignedInt = 0,
    /// Major type 1.
    NegativeInt = 1,
    /// Major type 2.
    ByteString = 2,
    /// Major type 3.
    TextString = 3,
    /// Major type 4.
    Array = 4,
    /// Major type 5.
    Map = 5,
    /// Major type 6.
    Tag = 6,
    /// Major type 7 (simple values and floats).
    SimpleOrFloat = 7,
}

impl MajorType {
    /// The numeric value of the major type (0..=7).
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// An integer of any size.
///
/// Values in `i64` range are stored inline; everything else is a `BigInt`. The representation is
/// normalized, so two equal integers always compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CborInteger(IntegerRepr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum IntegerRepr {
    Small(i64),
    Big(BigInt),
}

impl CborInteger {
    /// Construct from an arbitrary-precision integer, normalizing to the inline form when it fits.
    #[must_use]
    pub fn from_bigint(value: BigInt) -> Self {
        match value.to_i64() {
            Some(v) => Self(IntegerRepr::Small(v)),
            None => Self(IntegerRepr::Big(value)),
        }
    }

    /// Construct from the CBOR wire form: `raw` for major type 0, `-1 - raw` for major type 1.
    #[must_use]
    pub fn from_wire(negative: bool, raw: u64) -> Self {
        if negative {
            match i64::try_from(raw) {
                Ok(v) => Self(IntegerRepr::Small(-1 - v)),
                Err(_) => Self(IntegerRepr::Big(-BigInt::from(raw) - 1)),
            }
        } else {
            Self::from(raw)
        }
    }

    /// The value as `i64` if it fits.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match &self.0 {
            IntegerRepr::Small(v) => Some(*v),
            IntegerRepr::Big(_) => None,
        }
    }

    /// The value as `u64` if it is non-negative and fits.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match &self.0 {
            IntegerRepr::Small(v) => u64::try_from(*v).ok(),
            IntegerRepr::Big(b) => b.to_u64(),
        }
    }

    /// The value as an arbitrary-precision integer.
    #[must_use]
    pub fn to_bigint(&self) -> BigInt {
        match &self.0 {
            IntegerRepr::Small(v) => BigInt::from(*v),
            IntegerRepr::Big(b) => b.clone(),
        }
    }

    /// Returns `true` iff the value is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match &self.0 {
            IntegerRepr::Small(v) => *v < 0,
            IntegerRepr::Big(b) => b.is_negative(),
        }
    }

    /// Returns `true` iff the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        matches!(self.0, IntegerRepr::Small(0))
    }

    /// The major type 0/1 form `(negative, raw)` if the value lies in `[-2^64, 2^64-1]`.
    #[must_use]
    pub fn to_wire(&self) -> Option<(bool, u64)> {
        match &self.0 {
            IntegerRepr::Small(v) if *v >= 0 => Some((false, v.unsigned_abs())),
            IntegerRepr::Small(v) => Some((true, (-1 - *v).unsigned_abs())),
            IntegerRepr::Big(b) if b.is_negative() => {
                let raw: BigInt = -b - 1;
                raw.to_u64().map(|r| (true, r))
            }
            IntegerRepr::Big(b) => b.to_u64().map(|r| (false, r)),
        }
    }

    /// Big-endian bignum magnitude for tags 2 (positive) and 3 (negative, holding `-1 - value`).
    ///
    /// Returns `(is_negative, magnitude)` with leading zero bytes stripped.
    #[must_use]
    pub fn to_bignum_parts(&self) -> (bool, Vec<u8>) {
        let v = self.to_bigint();
        let (negative, n) = if v.is_negative() {
            (true, -v - 1u32)
        } else {
            (false, v)
        };
        let (_, mut bytes) = n.to_bytes_be();
        if n.is_zero() {
            bytes.clear();
        }
        (negative, bytes)
    }
}

impl From<i64> for CborInteger {
    fn from(value: i64) -> Self {
        Self(IntegerRepr::Small(value))
    }
}

impl From<u64> for CborInteger {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Self(IntegerRepr::Small(v)),
            Err(_) => Self(IntegerRepr::Big(BigInt::from(value))),
        }
    }
}

impl From<i32> for CborInteger {
    fn from(value: i32) -> Self {
        Self(IntegerRepr::Small(i64::from(value)))
    }
}

impl From<BigInt> for CborInteger {
    fn from(value: BigInt) -> Self {
        Self::from_bigint(value)
    }
}

impl core::fmt::Display for CborInteger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.0 {
            IntegerRepr::Small(v) => write!(f, "{v}"),
            IntegerRepr::Big(b) => write!(f, "{b}"),
        }
    }
}

/// An insertion-ordered CBOR map.
///
/// Keys are full CBOR values. Key equality is structural with floats compared by bit pattern,
/// which coincides with equality of the keys' encodings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CborMap {
    entries: IndexMap<CborValue, CborValue>,
}

impl CborMap {
    /// Construct an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an empty map with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` iff the map has no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace an entry, returning the previous value. Replacement keeps the original
    /// insertion position.
    pub fn insert(&mut self, key: impl Into<CborValue>, value: impl Into<CborValue>) -> Option<CborValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns `true` iff `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &CborValue) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &CborValue) -> Option<&CborValue> {
        self.entries.get(key)
    }

    /// Look up a value by text key.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&CborValue> {
        self.entries.get(&CborValue::Text(key.to_owned()))
    }

    /// Remove an entry, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &CborValue) -> Option<CborValue> {
        self.entries.shift_remove(key)
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&CborValue, &CborValue)> {
        self.entries.iter()
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &CborValue> {
        self.entries.keys()
    }

    /// Iterate over values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &CborValue> {
        self.entries.values()
    }
}

impl Hash for CborMap {
    // Map equality ignores entry order, so the hash must too.
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut acc = 0u64;
        for (k, v) in &self.entries {
            let mut h = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut h);
            v.hash(&mut h);
            acc = acc.wrapping_add(h.finish());
        }
        self.entries.len().hash(state);
        acc.hash(state);
    }
}

impl<K: Into<CborValue>, V: Into<CborValue>> FromIterator<(K, V)> for CborMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for CborMap {
    type Item = (CborValue, CborValue);
    type IntoIter = indexmap::map::IntoIter<CborValue, CborValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A CBOR data item.
#[derive(Debug, Clone)]
pub enum CborValue {
    /// Integer (major types 0/1, or a bignum when outside their range).
    Integer(CborInteger),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string.
    Text(String),
    /// Array.
    Array(Vec<CborValue>),
    /// Map.
    Map(CborMap),
    /// Tagged value.
    Tag(u64, Box<CborValue>),
    /// `false` / `true`.
    Bool(bool),
    /// `null`.
    Null,
    /// `undefined`.
    Undefined,
    /// Any other simple value (0..=19 or 32..=255).
    Simple(u8),
    /// Floating-point number of any width, widened to float64.
    Float(f64),
}

impl PartialEq for CborValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Tag(ta, a), Self::Tag(tb, b)) => ta == tb && a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Undefined, Self::Undefined) => true,
            (Self::Simple(a), Self::Simple(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for CborValue {}

impl Hash for CborValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Integer(v) => v.hash(state),
            Self::Bytes(v) => v.hash(state),
            Self::Text(v) => v.hash(state),
            Self::Array(v) => v.hash(state),
            Self::Map(v) => v.hash(state),
            Self::Tag(t, v) => {
                t.hash(state);
                v.hash(state);
            }
            Self::Bool(v) => v.hash(state),
            Self::Null | Self::Undefined => {}
            Self::Simple(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
        }
    }
}

impl CborValue {
    /// Construct a tagged value.
    #[must_use]
    pub fn tagged(tag: u64, value: impl Into<Self>) -> Self {
        Self::Tag(tag, Box::new(value.into()))
    }

    /// The major type of the outermost encoding of this value.
    #[must_use]
    pub fn major_type(&self) -> MajorType {
        match self {
            Self::Integer(i) => match i.to_wire() {
                Some((false, _)) => MajorType::UnsignedInt,
                Some((true, _)) => MajorType::NegativeInt,
                None => MajorType::Tag,
            },
            Self::Bytes(_) => MajorType::ByteString,
            Self::Text(_) => MajorType::TextString,
            Self::Array(_) => MajorType::Array,
            Self::Map(_) => MajorType::Map,
            Self::Tag(..) => MajorType::Tag,
            Self::Bool(_) | Self::Null | Self::Undefined | Self::Simple(_) | Self::Float(_) => {
                MajorType::SimpleOrFloat
            }
        }
    }

    /// Tags wrapping this value, outermost first.
    #[must_use]
    pub fn tags(&self) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur = self;
        while let Self::Tag(t, inner) = cur {
            out.push(*t);
            cur = inner;
        }
        out
    }

    /// Returns `true` iff this value is tagged at all.
    #[inline]
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        matches!(self, Self::Tag(..))
    }

    /// The outermost tag, if any.
    #[must_use]
    pub const fn most_outer_tag(&self) -> Option<u64> {
        match self {
            Self::Tag(t, _) => Some(*t),
            _ => None,
        }
    }

    /// The innermost tag, if any.
    #[must_use]
    pub fn most_inner_tag(&self) -> Option<u64> {
        let mut cur = self;
        let mut found = None;
        while let Self::Tag(t, inner) = cur {
            found = Some(*t);
            cur = inner;
        }
        found
    }

    /// Returns `true` iff `tag` appears anywhere in the tag chain.
    #[must_use]
    pub fn has_tag(&self, tag: u64) -> bool {
        let mut cur = self;
        while let Self::Tag(t, inner) = cur {
            if *t == tag {
                return true;
            }
            cur = inner;
        }
        false
    }

    /// Borrow the value beneath all tags.
    #[must_use]
    pub fn untagged(&self) -> &Self {
        let mut cur = self;
        while let Self::Tag(_, inner) = cur {
            cur = inner;
        }
        cur
    }

    /// Strip every tag.
    #[must_use]
    pub fn untag(self) -> Self {
        let mut cur = self;
        while let Self::Tag(_, inner) = cur {
            cur = *inner;
        }
        cur
    }

    /// Strip exactly the outermost tag; untagged values are returned unchanged.
    #[must_use]
    pub fn untag_one(self) -> Self {
        match self {
            Self::Tag(_, inner) => *inner,
            other => other,
        }
    }

    /// Wrap this value in `tag`, which becomes the outermost tag.
    #[must_use]
    pub fn with_tag(self, tag: u64) -> Self {
        Self::Tag(tag, Box::new(self))
    }

    /// Wrap this value in `tags`, listed outermost first. Tags are applied innermost-first.
    #[must_use]
    pub fn with_tags(self, tags: &[u64]) -> Self {
        tags.iter().rev().fold(self, |v, t| v.with_tag(*t))
    }

    /// Integer payload, if this is an (untagged) integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<&CborInteger> {
        match self {
            Self::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Text payload, if this is an (untagged) text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Byte payload, if this is an (untagged) byte string.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Array payload, if this is an (untagged) array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Map payload, if this is an (untagged) map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&CborMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Float payload, if this is an (untagged) float.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Boolean payload, if this is an (untagged) boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` iff this is `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<CborInteger> for CborValue {
    fn from(value: CborInteger) -> Self {
        Self::Integer(value)
    }
}

impl From<i64> for CborValue {
    fn from(value: i64) -> Self {
        Self::Integer(value.into())
    }
}

impl From<i32> for CborValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u64> for CborValue {
    fn from(value: u64) -> Self {
        Self::Integer(value.into())
    }
}

impl From<BigInt> for CborValue {
    fn from(value: BigInt) -> Self {
        Self::Integer(value.into())
    }
}

impl From<bool> for CborValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for CborValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<f32> for CborValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<&str> for CborValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for CborValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for CborValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for CborValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<Self>> for CborValue {
    fn from(value: Vec<Self>) -> Self {
        Self::Array(value)
    }
}

impl From<CborMap> for CborValue {
    fn from(value: CborMap) -> Self {
        Self::Map(value)
    }
}

/// Build a `BigInt` from a big-endian unsigned magnitude.
pub(crate) fn bigint_from_be(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}
