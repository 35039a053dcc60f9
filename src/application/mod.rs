//! Application layer - orchestrates the error-translation pipeline.
//!
//! Coordinates the pure failure domain with the codec and outbound ports.

pub mod error_dispatcher;
pub mod safe_serializer;

pub use error_dispatcher::{DispatchError, ErrorDispatcher, JSON_CONTENT_TYPE};
pub use safe_serializer::{SafeSerializer, SerializationError};
