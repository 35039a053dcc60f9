//! Serialization adapters for client error payloads.

mod json_codec;

pub use json_codec::JsonResponseCodec;
