//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `broker` - round-robin broker selection and plain/TLS transport
//! - `relay` - the shared upstream STOMP link
//! - `serialization` - JSON encoding of error payloads
//! - `websocket` - client endpoint and session registry

pub mod broker;
pub mod relay;
pub mod serialization;
pub mod websocket;
