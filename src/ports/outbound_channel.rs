//! OutboundChannel port - delivery of frames to client sessions.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::stomp::StompFrame;

/// Errors that can occur while enqueuing a frame for a client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The frame carries no session id to route on.
    #[error("Frame has no session id")]
    MissingSession,

    /// No live session with this id.
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// The session's queue was closed (client disconnected).
    #[error("Session {0} is closed")]
    Closed(String),

    /// The session's queue is at capacity.
    #[error("Session {0} is not keeping up")]
    Full(String),
}

/// Port for enqueuing frames towards the session named by `frame.session_id`.
///
/// Implementations must be safe for concurrent use; the same channel is
/// shared by every connection handler and the broker relay.
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Enqueues `frame` for delivery. Not retried on failure.
    async fn send(&self, frame: StompFrame) -> Result<(), ChannelError>;

    /// Enqueues a copy of `frame` for every live session, returning how many accepted it.
    async fn broadcast(&self, frame: StompFrame) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn OutboundChannel) {}

    #[test]
    fn channel_error_names_session() {
        assert_eq!(
            ChannelError::UnknownSession("s1".to_string()).to_string(),
            "Unknown session: s1"
        );
    }
}
