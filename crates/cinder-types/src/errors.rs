//! Codec error types.

use thiserror::Error;

/// Errors from the canonical wire framing.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload did not decode as the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),
}
