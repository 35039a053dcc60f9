//! SafeSerializer - encodes error responses with a plain-text fallback.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::failure::StructuredErrorResponse;
use crate::ports::{CodecError, ResponseCodec};

/// Raised only when both the structured and the fallback encoding fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("Unable to serialize response ({primary}); fallback also failed ({fallback})")]
    Unrecoverable {
        primary: CodecError,
        fallback: CodecError,
    },
}

/// Serializer that never gives up on the first encoding failure.
#[derive(Clone)]
pub struct SafeSerializer {
    codec: Arc<dyn ResponseCodec>,
}

impl SafeSerializer {
    pub fn new(codec: Arc<dyn ResponseCodec>) -> Self {
        Self { codec }
    }

    /// Encodes `response`, falling back to its string form on failure.
    ///
    /// # Errors
    ///
    /// Returns [`SerializationError::Unrecoverable`] if the fallback also
    /// fails; without bytes no frame can be sent.
    pub fn serialize(&self, response: &StructuredErrorResponse) -> Result<Vec<u8>, SerializationError> {
        let primary = match self.codec.encode_response(response) {
            Ok(bytes) => return Ok(bytes),
            Err(err) => err,
        };

        tracing::error!(error = %primary, "Unable to serialize structured error response");
        tracing::info!("Using the string form of the response as payload");

        self.codec
            .encode_text(&response.to_string())
            .map_err(|fallback| SerializationError::Unrecoverable { primary, fallback })
    }
}
