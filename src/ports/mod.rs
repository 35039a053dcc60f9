//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `ResponseCodec` - Encoder for structured error payloads
//! - `OutboundChannel` - Per-session delivery of frames to clients

mod outbound_channel;
mod response_codec;

pub use outbound_channel::{ChannelError, OutboundChannel};
pub use response_codec::{CodecError, ResponseCodec};
