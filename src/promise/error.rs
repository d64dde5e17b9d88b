//! Promise codec errors.

use thiserror::Error;

/// Errors raised while deriving promises or encoding/decoding messages.
///
/// A codec error aborts the single encode or decode call that raised it;
/// it never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The named hash algorithm (or multihash code) is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A parameter cannot be carried by the wire form (empty, or contains
    /// whitespace).
    #[error("Invalid parameter at position {index}: {parameter:?}")]
    InvalidParameter { index: usize, parameter: String },

    /// The bytes do not form a valid message or promise.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),
}
