//! Registry of live client sessions.
//!
//! Each connection registers the sender half of its outbound queue under
//! its session id. The broker relay and the error dispatcher reach clients
//! only through this registry, via [`OutboundChannel`].

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::domain::stomp::StompFrame;
use crate::ports::{ChannelError, OutboundChannel};

/// Live sessions keyed by session id.
///
/// # Thread Safety
///
/// Deliveries (reads) vastly outnumber connects and disconnects (writes),
/// so the map sits behind an `RwLock`. Senders are cloned out of the lock
/// before enqueuing.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, mpsc::Sender<StompFrame>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session_id`, replacing any previous sender under that id.
    pub async fn register(&self, session_id: impl Into<String>, sender: mpsc::Sender<StompFrame>) {
        let session_id = session_id.into();
        tracing::debug!(%session_id, "Session registered");
        self.sessions.write().await.insert(session_id, sender);
    }

    pub async fn unregister(&self, session_id: &str) {
        if self.sessions.write().await.remove(session_id).is_some() {
            tracing::debug!(%session_id, "Session unregistered");
        }
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn sender(&self, session_id: &str) -> Option<mpsc::Sender<StompFrame>> {
        self.sessions.read().await.get(session_id).cloned()
    }
}

#[async_trait]
impl OutboundChannel for SessionRegistry {
    async fn send(&self, frame: StompFrame) -> Result<(), ChannelError> {
        let session_id = frame.session_id.clone().ok_or(ChannelError::MissingSession)?;
        let sender = self
            .sender(&session_id)
            .await
            .ok_or_else(|| ChannelError::UnknownSession(session_id.clone()))?;

        sender.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => ChannelError::Full(session_id),
            mpsc::error::TrySendError::Closed(_) => ChannelError::Closed(session_id),
        })
    }

    async fn broadcast(&self, frame: StompFrame) -> usize {
        let sessions = self.sessions.read().await;
        let mut delivered = 0;
        for (session_id, sender) in sessions.iter() {
            let copy = frame.clone().with_session(session_id.clone());
            match sender.try_send(copy) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::debug!(%session_id, error = %err, "Broadcast skipped session");
                }
            }
        }
        delivered
    }
}
