//! Error types for source map handling.

/// Error type for source map decoding and chaining.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// A character outside the Base64 alphabet.
    #[error("invalid base64 character {0:?} in mappings")]
    InvalidCharacter(char),

    /// A VLQ value whose continuation bit runs past the end of the segment.
    #[error("truncated VLQ value in mappings")]
    TruncatedValue,

    /// A VLQ value too large to fit the decoder.
    #[error("VLQ value overflow in mappings")]
    Overflow,

    /// A segment with a field count other than 1, 4 or 5.
    #[error("segment has {0} fields, expected 1, 4 or 5")]
    SegmentArity(usize),

    /// A relative field that resolves to a negative absolute value.
    #[error("mappings resolve to a negative {0}")]
    NegativeField(&'static str),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type for source map operations.
pub type MapResult<T> = Result<T, MapError>;
