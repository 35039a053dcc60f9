//! ResponseCodec port - synchronous encoder for client error payloads.

use thiserror::Error;

use crate::domain::failure::StructuredErrorResponse;

/// Errors raised by a [`ResponseCodec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Black-box codec turning a response into payload bytes.
///
/// Both operations may fail; callers decide how to recover.
pub trait ResponseCodec: Send + Sync {
    /// Encodes the structured response.
    fn encode_response(&self, response: &StructuredErrorResponse) -> Result<Vec<u8>, CodecError>;

    /// Encodes a plain string payload.
    fn encode_text(&self, text: &str) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ResponseCodec) {}

    #[test]
    fn codec_error_displays_reason() {
        let err = CodecError::Encode("key must be a string".to_string());
        assert_eq!(err.to_string(), "Encoding failed: key must be a string");
    }
}
