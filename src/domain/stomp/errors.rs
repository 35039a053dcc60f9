//! Frame decoding errors.

use thiserror::Error;

/// Errors raised while decoding STOMP frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Unknown STOMP command '{0}'")]
    UnknownCommand(String),

    #[error("Malformed header line '{0}'")]
    MalformedHeader(String),

    #[error("Invalid escape sequence in header '{0}'")]
    InvalidEscape(String),

    #[error("Invalid content-length '{0}'")]
    InvalidContentLength(String),

    #[error("Frame body is not terminated by NULL")]
    MissingNullTerminator,

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Frame exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    #[error("Incomplete frame")]
    Incomplete,

    #[error("Unexpected trailing data after frame")]
    TrailingData,
}
