use thiserror::Error;

/// Everything that can go wrong while encoding or decoding.
///
/// Failures are all-or-nothing: whichever call produced the error returns no
/// partial result, and any bytes already written to an output buffer must be
/// treated as garbage.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A field name was rejected by the key validator.
    #[error("key {key:?} {reason}")]
    InvalidFieldName { key: String, reason: &'static str },

    /// A value carries one of the reserved extended-type identities but does
    /// not satisfy that type's wire contract.
    #[error("{expected} does not satisfy its wire contract: {detail}")]
    ReservedTypeMismatch {
        expected: &'static str,
        detail: String,
    },

    /// The decoder hit bytes that are not valid BSON.
    #[error("malformed input at offset {offset}: {detail}")]
    MalformedInput { offset: usize, detail: &'static str },

    /// Documents or arrays nest deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("nesting exceeds the maximum document depth")]
    DepthLimitExceeded,

    /// The output region handed to the encoder cannot hold the value.
    #[error("output buffer too small: {needed} more bytes needed, {remaining} remaining")]
    BufferTooSmall { needed: usize, remaining: usize },
}

/// Result type returned by the codec entry points.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(offset: usize, detail: &'static str) -> Self {
        Error::MalformedInput { offset, detail }
    }

    pub(crate) fn mismatch(expected: &'static str, detail: impl Into<String>) -> Self {
        Error::ReservedTypeMismatch {
            expected,
            detail: detail.into(),
        }
    }
}
