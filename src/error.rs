use core::fmt;

/// The class of a failure, used by callers to decide how to react.
///
/// - **Malformed**: the input (CBOR bytes, JSON text, a tag payload, a reference index) violates
///   the format. Reject the value; this is never a process-level failure.
/// - **Overflow**: the input was well-formed but a requested numeric narrowing is lossy.
/// - **Argument**: the caller broke an API contract (offset/length outside the buffer, bad option).
/// - **Internal**: an invariant of this crate failed, or the underlying stream failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Decode-format violation.
    Malformed,
    /// Numeric range violation.
    Overflow,
    /// Programming-contract violation at a public entry point.
    Argument,
    /// Defect in this crate or I/O failure of a caller-supplied stream.
    Internal,
}

/// A structured error code identifying why an operation was rejected.
///
/// This enum is string-free so errors stay `Copy` and cheap to construct on hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Unexpected end-of-input while decoding.
    UnexpectedEof,
    /// Input contains trailing bytes after the single CBOR data item.
    TrailingBytes,
    /// Reserved additional-info value (28..30) was used.
    ReservedAdditionalInfo,
    /// Malformed indefinite-length item (wrong chunk type, indefinite length where forbidden).
    InvalidIndefiniteLength,
    /// A "break" stop code appeared outside an indefinite-length item.
    UnexpectedBreak,
    /// Two-byte simple value encoding used for a value below 32.
    InvalidSimpleValue,
    /// Nesting depth limit exceeded.
    DepthLimitExceeded,
    /// An array, map, or string length exceeds the configured limits.
    LengthLimitExceeded,
    /// Duplicate map key detected.
    DuplicateMapKey,

    /// Invalid UTF-8 sequence.
    Utf8Invalid,
    /// Invalid UTF-16 sequence (unpaired surrogate or truncated code unit).
    Utf16Invalid,
    /// Invalid UTF-32 code unit.
    Utf32Invalid,

    /// JSON grammar violation.
    JsonSyntax,
    /// Trailing comma in a JSON object or array.
    JsonTrailingComma,
    /// Unpaired surrogate `\u` escape in a JSON string.
    JsonUnpairedSurrogate,
    /// JSON nesting deeper than the parser allows.
    JsonNestingTooDeep,
    /// Unescaped control character in a JSON string.
    JsonControlCharacter,
    /// Unknown or truncated escape sequence in a JSON string.
    JsonInvalidEscape,
    /// Malformed JSON number.
    JsonInvalidNumber,
    /// Non-whitespace data after the top-level JSON value.
    JsonTrailingData,

    /// Tag payload has a major type the tag does not accept.
    TagPayloadType,
    /// Tag payload array has the wrong length.
    TagArrayLength,
    /// Tag payload requires an integral value.
    TagNonIntegral,
    /// Decimal/bigfloat exponent does not fit 64 bits in the non-extended form.
    TagExponentTooLarge,
    /// Rational denominator is not positive.
    TagDenominator,
    /// Date/time text does not match the supported grammar, or a date field is out of range.
    TagDateFormat,
    /// URI text is not a valid IRI reference.
    TagUriInvalid,
    /// UUID byte string is not exactly 16 bytes.
    TagUuidLength,
    /// UUID text is not in the 36-character hyphenated form.
    UuidString,

    /// Shared/string reference index is out of range.
    ReferenceOutOfRange,
    /// Shared/string reference index is negative or not an integer.
    ReferenceNegative,
    /// Shared reference points at a value that is still being decoded.
    ReferenceRecursive,

    /// No converter is registered for the requested host type.
    ConverterMissing,
    /// A record field is missing or has the wrong type.
    RecordField,

    /// Numeric value does not fit the requested type.
    NumberOverflow,
    /// NaN cannot be converted to the requested type.
    NumberNaN,
    /// The value has no exact representation in the requested numeric type.
    InexactConversion,
    /// Arithmetic overflow while computing a length/offset.
    LengthOverflow,
    /// Memory allocation failed while decoding into owned structures.
    AllocationFailed,

    /// Offset/length arguments lie outside the supplied buffer.
    ArgumentOutOfRange,
    /// Unknown option name or unparsable option value.
    InvalidOption,

    /// Canonical encoding failed for a well-formed value.
    CanonicalInvariant,
    /// The caller-supplied stream failed.
    IoFailure,
}

impl ErrorCode {
    /// Classify this code into the error taxonomy.
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::NumberOverflow
            | Self::NumberNaN
            | Self::InexactConversion
            | Self::LengthOverflow
            | Self::AllocationFailed => ErrorKind::Overflow,
            Self::ArgumentOutOfRange | Self::InvalidOption => ErrorKind::Argument,
            Self::CanonicalInvariant | Self::IoFailure => ErrorKind::Internal,
            _ => ErrorKind::Malformed,
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEof => "unexpected end of input",
            Self::TrailingBytes => "trailing bytes after single CBOR item",
            Self::ReservedAdditionalInfo => "reserved additional info value",
            Self::InvalidIndefiniteLength => "malformed indefinite-length item",
            Self::UnexpectedBreak => "unexpected break code",
            Self::InvalidSimpleValue => "invalid simple value encoding",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::LengthLimitExceeded => "length exceeds decode limits",
            Self::DuplicateMapKey => "duplicate map key",

            Self::Utf8Invalid => "invalid UTF-8",
            Self::Utf16Invalid => "invalid UTF-16",
            Self::Utf32Invalid => "invalid UTF-32",

            Self::JsonSyntax => "JSON syntax error",
            Self::JsonTrailingComma => "trailing comma in JSON",
            Self::JsonUnpairedSurrogate => "unpaired surrogate in JSON string",
            Self::JsonNestingTooDeep => "JSON too deeply nested",
            Self::JsonControlCharacter => "control character in JSON string",
            Self::JsonInvalidEscape => "invalid escape in JSON string",
            Self::JsonInvalidNumber => "invalid JSON number",
            Self::JsonTrailingData => "data after end of JSON value",

            Self::TagPayloadType => "tag payload has unexpected type",
            Self::TagArrayLength => "tag payload array has wrong length",
            Self::TagNonIntegral => "tag payload must be integral",
            Self::TagExponentTooLarge => "exponent does not fit 64 bits",
            Self::TagDenominator => "rational denominator must be positive",
            Self::TagDateFormat => "invalid date/time",
            Self::TagUriInvalid => "invalid URI",
            Self::TagUuidLength => "UUID must be 16 bytes",
            Self::UuidString => "invalid UUID string",

            Self::ReferenceOutOfRange => "reference index out of range",
            Self::ReferenceNegative => "reference index must be a non-negative integer",
            Self::ReferenceRecursive => "recursive shared reference",

            Self::ConverterMissing => "no converter registered for type",
            Self::RecordField => "missing or mistyped record field",

            Self::NumberOverflow => "number out of range",
            Self::NumberNaN => "NaN cannot be converted",
            Self::InexactConversion => "no exact representation",
            Self::LengthOverflow => "length overflow",
            Self::AllocationFailed => "allocation failed",

            Self::ArgumentOutOfRange => "offset/length out of range",
            Self::InvalidOption => "invalid option",

            Self::CanonicalInvariant => "canonical encoding invariant violated",
            Self::IoFailure => "stream I/O failure",
        }
    }
}

/// An error with a stable code and the offset where it was detected.
///
/// Offsets are byte offsets for CBOR input and character offsets for JSON input. They are `0` when
/// no position is meaningful (numeric conversions, argument checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CborError {
    /// The error code.
    pub code: ErrorCode,
    /// Offset into the input where the error was detected.
    pub offset: usize,
}

impl CborError {
    /// Construct an error at `offset`.
    #[inline]
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }

    /// Construct an error with no meaningful position.
    #[inline]
    #[must_use]
    pub const fn at_start(code: ErrorCode) -> Self {
        Self { code, offset: 0 }
    }

    /// The taxonomy class of this error.
    #[inline]
    #[must_use]
    pub const fn kind(self) -> ErrorKind {
        self.code.kind()
    }

    /// Returns true iff the input itself was rejected (as opposed to a range or caller problem).
    #[inline]
    #[must_use]
    pub const fn is_malformed(self) -> bool {
        matches!(self.code.kind(), ErrorKind::Malformed)
    }

    /// Returns true iff a numeric narrowing was rejected.
    #[inline]
    #[must_use]
    pub const fn is_overflow(self) -> bool {
        matches!(self.code.kind(), ErrorKind::Overflow)
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.code.message();
        match self.code.kind() {
            ErrorKind::Malformed => write!(f, "malformed input at {}: {msg}", self.offset),
            ErrorKind::Overflow => write!(f, "overflow: {msg}"),
            ErrorKind::Argument => write!(f, "invalid argument: {msg}"),
            ErrorKind::Internal => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CborError {}

impl From<std::io::Error> for CborError {
    fn from(_: std::io::Error) -> Self {
        Self::at_start(ErrorCode::IoFailure)
    }
}

/// Validate an `(offset, len)` window against a buffer of `total` elements.
///
/// # Errors
///
/// Returns `ArgumentOutOfRange` if the window does not lie within the buffer.
#[inline]
pub fn check_range(total: usize, offset: usize, len: usize) -> Result<(), CborError> {
    match offset.checked_add(len) {
        Some(end) if end <= total => Ok(()),
        _ => Err(CborError::at_start(ErrorCode::ArgumentOutOfRange)),
    }
}
