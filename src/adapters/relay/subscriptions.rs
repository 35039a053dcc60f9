//! Active client subscriptions on the upstream link.

use std::collections::HashMap;

use crate::domain::stomp::{headers, StompCommand, StompFrame};

/// SUBSCRIBE frames per session, keyed by the client's subscription id.
///
/// Used to replay subscriptions after the link is re-opened and to
/// unsubscribe a session's leftovers when it disconnects.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    sessions: HashMap<String, HashMap<String, StompFrame>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records SUBSCRIBE and UNSUBSCRIBE frames; others are ignored.
    pub fn track(&mut self, frame: &StompFrame) {
        let (Some(session), Some(id)) = (frame.session_id.as_deref(), frame.header(headers::ID))
        else {
            return;
        };

        match frame.command {
            StompCommand::Subscribe => {
                self.sessions
                    .entry(session.to_string())
                    .or_default()
                    .insert(id.to_string(), frame.clone());
            }
            StompCommand::Unsubscribe => {
                if let Some(subscriptions) = self.sessions.get_mut(session) {
                    subscriptions.remove(id);
                    if subscriptions.is_empty() {
                        self.sessions.remove(session);
                    }
                }
            }
            _ => {}
        }
    }

    /// Forgets `session`, returning UNSUBSCRIBE frames for what it left open.
    pub fn remove_session(&mut self, session: &str) -> Vec<StompFrame> {
        self.sessions
            .remove(session)
            .map(|subscriptions| {
                subscriptions
                    .into_keys()
                    .map(|id| {
                        StompFrame::new(StompCommand::Unsubscribe)
                            .with_header(headers::ID, id)
                            .with_session(session)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// SUBSCRIBE frames to send on a fresh link, without their receipts.
    pub fn replay(&self) -> Vec<StompFrame> {
        self.sessions
            .values()
            .flat_map(|subscriptions| subscriptions.values())
            .map(|frame| {
                let mut frame = frame.clone();
                frame.remove_header(headers::RECEIPT);
                frame
            })
            .collect()
    }

    /// Number of open subscriptions across all sessions.
    pub fn len(&self) -> usize {
        self.sessions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscribe(session: &str, id: &str) -> StompFrame {
        StompFrame::new(StompCommand::Subscribe)
            .with_header("id", id)
            .with_header("destination", "/topic/a")
            .with_header("receipt", "r")
            .with_session(session)
    }

    fn unsubscribe(session: &str, id: &str) -> StompFrame {
        StompFrame::new(StompCommand::Unsubscribe)
            .with_header("id", id)
            .with_session(session)
    }

    #[test]
    fn tracks_subscribe_and_unsubscribe() {
        let mut table = SubscriptionTable::new();
        table.track(&subscribe("s1", "0"));
        table.track(&subscribe("s1", "1"));
        table.track(&subscribe("s2", "0"));
        assert_eq!(table.len(), 3);

        table.track(&unsubscribe("s1", "0"));
        assert_eq!(table.len(), 2);

        table.track(&unsubscribe("s2", "0"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ignores_frames_without_session_or_id() {
        let mut table = SubscriptionTable::new();
        table.track(&StompFrame::new(StompCommand::Subscribe).with_header("id", "0"));
        table.track(&StompFrame::new(StompCommand::Subscribe).with_session("s1"));
        table.track(&StompFrame::new(StompCommand::Send).with_session("s1"));
        assert!(table.is_empty());
    }

    #[test]
    fn removing_session_yields_unsubscribes() {
        let mut table = SubscriptionTable::new();
        table.track(&subscribe("s1", "0"));
        table.track(&subscribe("s2", "7"));

        let frames = table.remove_session("s1");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, StompCommand::Unsubscribe);
        assert_eq!(frames[0].header("id"), Some("0"));
        assert_eq!(frames[0].session_id.as_deref(), Some("s1"));

        assert_eq!(table.len(), 1);
        assert!(table.remove_session("s1").is_empty());
    }

    #[test]
    fn replay_drops_receipts() {
        let mut table = SubscriptionTable::new();
        table.track(&subscribe("s1", "0"));

        let replay = table.replay();
        assert_eq!(replay.len(), 1);
        assert_eq!(replay[0].receipt(), None);
        assert_eq!(replay[0].destination(), Some("/topic/a"));
    }
}
