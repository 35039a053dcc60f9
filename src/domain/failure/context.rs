//! Correlation identifiers of the client a failure belongs to.

use crate::domain::stomp::StompFrame;

/// Read-only view of who a failure should be reported to.
///
/// Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub session_id: Option<String>,
    pub receipt_id: Option<String>,
    pub principal_name: Option<String>,
}

impl ClientContext {
    /// Context of the session that sent `frame`.
    pub fn from_frame(frame: &StompFrame) -> Self {
        Self {
            session_id: frame.session_id.clone(),
            receipt_id: frame.receipt().map(str::to_string),
            principal_name: frame.principal.clone(),
        }
    }

    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    pub fn with_principal(mut self, name: impl Into<String>) -> Self {
        self.principal_name = Some(name.into());
        self
    }

    /// Principal name if present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.principal_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stomp::StompCommand;

    #[test]
    fn derives_fields_from_frame() {
        let frame = StompFrame::new(StompCommand::Send)
            .with_header("receipt", "r1")
            .with_session("s1")
            .with_principal("alice");

        let context = ClientContext::from_frame(&frame);
        assert_eq!(context.session_id.as_deref(), Some("s1"));
        assert_eq!(context.receipt_id.as_deref(), Some("r1"));
        assert_eq!(context.principal_name.as_deref(), Some("alice"));
    }

    #[test]
    fn absent_fields_stay_absent() {
        let context = ClientContext::from_frame(&StompFrame::new(StompCommand::Send));
        assert_eq!(context, ClientContext::default());
    }

    #[test]
    fn blank_principal_has_no_display_name() {
        let context = ClientContext::for_session("s1").with_principal("   ");
        assert_eq!(context.display_name(), None);
    }
}
