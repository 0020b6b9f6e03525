/// Default maximum nesting depth for CBOR decoding.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Maximum nesting depth accepted by the JSON parser.
pub const JSON_MAX_DEPTH: usize = 1000;

/// Default maximum container length limit for arrays/maps.
///
/// This is a safety limit; adjust explicitly for your deployment.
pub const DEFAULT_MAX_CONTAINER_LEN: usize = 1 << 20;

/// Decode-time resource limits.
///
/// Limits are checked before allocation, so a hostile length prefix cannot force a large
/// reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum nesting depth.
    pub max_depth: usize,
    /// Maximum array length.
    pub max_array_len: usize,
    /// Maximum map length (pairs).
    pub max_map_len: usize,
    /// Maximum byte-string length (also applies to bignum magnitudes).
    pub max_bytes_len: usize,
    /// Maximum text-string length in UTF-8 bytes.
    pub max_text_len: usize,
}

impl DecodeLimits {
    /// Construct limits derived from a maximum message size.
    ///
    /// No single string or container in a message of `max_message_bytes` can legitimately be longer
    /// than the message itself.
    #[must_use]
    pub fn for_bytes(max_message_bytes: usize) -> Self {
        let max_container_len = max_message_bytes.min(DEFAULT_MAX_CONTAINER_LEN);
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_len: max_container_len,
            max_map_len: max_container_len,
            max_bytes_len: max_message_bytes,
            max_text_len: max_message_bytes,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_array_len: DEFAULT_MAX_CONTAINER_LEN,
            max_map_len: DEFAULT_MAX_CONTAINER_LEN,
            max_bytes_len: usize::MAX,
            max_text_len: usize::MAX,
        }
    }
}
