//! Session namespacing of ids on the shared upstream link.
//!
//! Many client sessions share one broker connection, so subscription ids,
//! transaction names and receipts are prefixed with the owning session id on the way up
//! (`<session>:<id>`) and split apart again on the way down. Session ids are
//! generated by the gateway and never contain the separator.

use crate::domain::stomp::{headers, StompCommand, StompFrame};

const SEPARATOR: char = ':';

/// Prefixes `value` with `session`.
pub fn namespaced(session: &str, value: &str) -> String {
    format!("{}{}{}", session, SEPARATOR, value)
}

/// Splits a namespaced value into `(session, original)`.
pub fn split(value: &str) -> Option<(&str, &str)> {
    value
        .split_once(SEPARATOR)
        .filter(|(session, _)| !session.is_empty())
}

/// Rewrites a client frame for the upstream link.
///
/// Frames without a session are passed through untouched.
pub fn to_upstream(mut frame: StompFrame) -> StompFrame {
    let Some(session) = frame.session_id.clone() else {
        return frame;
    };

    if matches!(
        frame.command,
        StompCommand::Subscribe | StompCommand::Unsubscribe
    ) {
        if let Some(id) = frame.header(headers::ID).map(str::to_string) {
            frame.set_header(headers::ID, namespaced(&session, &id));
        }
    }
    if let Some(transaction) = frame.header(headers::TRANSACTION).map(str::to_string) {
        frame.set_header(headers::TRANSACTION, namespaced(&session, &transaction));
    }
    if let Some(receipt) = frame.receipt().map(str::to_string) {
        frame.set_header(headers::RECEIPT, namespaced(&session, &receipt));
    }
    frame
}

/// Restores client ids on a broker frame and returns the owning session.
///
/// MESSAGE frames are correlated by `subscription`, RECEIPT and ERROR frames
/// by `receipt-id`.
pub fn from_upstream(frame: &mut StompFrame) -> Option<String> {
    let header = match frame.command {
        StompCommand::Message => headers::SUBSCRIPTION,
        StompCommand::Receipt | StompCommand::Error => headers::RECEIPT_ID,
        _ => return None,
    };

    let value = frame.header(header)?.to_string();
    let (session, original) = split(&value)?;
    let session = session.to_string();

    frame.set_header(header, original);
    frame.session_id = Some(session.clone());
    Some(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_id_and_receipt_are_namespaced() {
        let frame = StompFrame::new(StompCommand::Subscribe)
            .with_header("id", "sub-0")
            .with_header("destination", "/topic/a")
            .with_header("receipt", "r1")
            .with_session("s1");

        let upstream = to_upstream(frame);
        assert_eq!(upstream.header("id"), Some("s1:sub-0"));
        assert_eq!(upstream.receipt(), Some("s1:r1"));
        assert_eq!(upstream.destination(), Some("/topic/a"));
    }

    #[test]
    fn send_keeps_its_headers_except_receipt() {
        let frame = StompFrame::new(StompCommand::Send)
            .with_header("id", "not-a-subscription")
            .with_header("receipt", "r2")
            .with_session("s1");

        let upstream = to_upstream(frame);
        assert_eq!(upstream.header("id"), Some("not-a-subscription"));
        assert_eq!(upstream.receipt(), Some("s1:r2"));
    }

    #[test]
    fn same_transaction_name_from_two_sessions_stays_distinct() {
        let begin = |session: &str| {
            StompFrame::new(StompCommand::Begin)
                .with_header("transaction", "tx1")
                .with_session(session)
        };

        let first = to_upstream(begin("s1"));
        let second = to_upstream(begin("s2"));
        assert_eq!(first.header("transaction"), Some("s1:tx1"));
        assert_eq!(second.header("transaction"), Some("s2:tx1"));
    }

    #[test]
    fn transactional_send_and_commit_share_the_namespaced_name() {
        let send = StompFrame::new(StompCommand::Send)
            .with_header("destination", "/queue/a")
            .with_header("transaction", "tx1")
            .with_session("s1");
        let commit = StompFrame::new(StompCommand::Commit)
            .with_header("transaction", "tx1")
            .with_session("s1");

        assert_eq!(to_upstream(send).header("transaction"), Some("s1:tx1"));
        assert_eq!(to_upstream(commit).header("transaction"), Some("s1:tx1"));
    }

    #[test]
    fn frames_without_session_pass_through() {
        let frame = StompFrame::new(StompCommand::Subscribe).with_header("id", "0");
        assert_eq!(to_upstream(frame.clone()), frame);
    }

    #[test]
    fn message_is_routed_by_subscription() {
        let mut frame = StompFrame::new(StompCommand::Message)
            .with_header("subscription", "s1:sub-0")
            .with_header("destination", "/topic/a");

        assert_eq!(from_upstream(&mut frame), Some("s1".to_string()));
        assert_eq!(frame.header("subscription"), Some("sub-0"));
        assert_eq!(frame.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn original_id_may_contain_separator() {
        let mut frame =
            StompFrame::new(StompCommand::Receipt).with_header("receipt-id", "s1:a:b");
        assert_eq!(from_upstream(&mut frame), Some("s1".to_string()));
        assert_eq!(frame.receipt_id(), Some("a:b"));
    }

    #[test]
    fn uncorrelated_error_has_no_session() {
        let mut frame = StompFrame::new(StompCommand::Error).with_header("message", "bad login");
        assert_eq!(from_upstream(&mut frame), None);
        assert_eq!(frame.session_id, None);
    }

    #[test]
    fn value_without_session_prefix_is_not_split() {
        assert_eq!(split(":orphan"), None);
        assert_eq!(split("orphan"), None);
    }
}
