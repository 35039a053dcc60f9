//! `serde_json` implementation of the ResponseCodec port.

use crate::domain::failure::StructuredErrorResponse;
use crate::ports::{CodecError, ResponseCodec};

/// Encodes responses as JSON objects and text as JSON strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResponseCodec;

impl ResponseCodec for JsonResponseCodec {
    fn encode_response(&self, response: &StructuredErrorResponse) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(response).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn encode_text(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(text).map_err(|e| CodecError::Encode(e.to_string()))
    }
}
