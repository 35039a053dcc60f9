//! STOMP 1.2 frame model and text codec.
//!
//! The gateway speaks STOMP on both sides: to browser clients over
//! WebSocket text messages and to brokers over TCP. Frames carry two routing
//! attributes (`session_id`, `principal`) that never appear on the wire.

mod codec;
mod command;
mod errors;
mod frame;

pub use codec::{decode, encode, StompDecoder, DEFAULT_MAX_FRAME_SIZE};
pub use command::StompCommand;
pub use errors::FrameError;
pub use frame::{headers, StompFrame};
