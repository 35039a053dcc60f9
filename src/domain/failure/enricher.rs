//! Builds the response payload for a failure.

use serde_json::Value;

use crate::domain::stomp::StompFrame;

use super::{Classification, ClientContext, ErrorClassifier, RelayFailure, StructuredErrorResponse};

/// Stateless builder of [`StructuredErrorResponse`] values.
pub struct ResponseEnricher;

impl ResponseEnricher {
    /// Response for a failure raised while processing `client`'s frame.
    ///
    /// `data` starts as the failure message, then follows the classification
    /// (a generic failure replaces it with its cause, or null), and finally
    /// becomes the client's payload when a frame is available.
    pub fn for_client_failure(
        failure: &RelayFailure,
        client: Option<&StompFrame>,
    ) -> StructuredErrorResponse {
        let mut response = StructuredErrorResponse::failed();
        response.data = failure.message().map(|message| Value::String(message.to_string()));
        Self::apply(&mut response, &ErrorClassifier::classify(failure));

        if let Some(frame) = client {
            response.data = Some(Value::String(frame.body_text()));
            Self::annotate_principal(&mut response, &ClientContext::from_frame(frame));
        }
        response
    }

    /// Response for a failure with no originating frame.
    pub fn for_failure(
        failure: &RelayFailure,
        context: Option<&ClientContext>,
    ) -> StructuredErrorResponse {
        let mut response = StructuredErrorResponse::failed();
        Self::apply(&mut response, &ErrorClassifier::classify(failure));

        if let Some(context) = context {
            Self::annotate_principal(&mut response, context);
        }
        response
    }

    /// Response wrapping an ERROR frame that came from the broker.
    pub fn for_broker_error(error_frame: &StompFrame) -> StructuredErrorResponse {
        StructuredErrorResponse {
            data: Some(Value::String(error_frame.body_text())),
            ..StructuredErrorResponse::failed()
        }
    }

    /// Overwrites status code, message and data where the classification sets them.
    pub fn apply(response: &mut StructuredErrorResponse, classification: &Classification) {
        if let Some(status_code) = classification.status_code {
            response.status_code = status_code;
        }
        if let Some(message) = &classification.message {
            response.message = message.clone();
        }
        if let Some(data) = &classification.data {
            response.data = data.clone();
        }
    }

    /// Appends `: [<name>]` when the context carries a non-blank principal.
    pub fn annotate_principal(response: &mut StructuredErrorResponse, context: &ClientContext) {
        if let Some(name) = context.display_name() {
            response.message = format!("{}: [{}]", response.message, name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stomp::StompCommand;
    use serde_json::json;

    fn client_frame() -> StompFrame {
        StompFrame::new(StompCommand::Send)
            .with_header("receipt", "rc1")
            .with_body("BAD CMD")
            .with_session("s1")
    }

    #[test]
    fn validation_failure_with_principal() {
        let frame = client_frame().with_principal("alice");
        let response =
            ResponseEnricher::for_client_failure(&RelayFailure::validation("bad field"), Some(&frame));

        assert_eq!(response.status_code, 400);
        assert_eq!(response.status, "Failed Message");
        assert_eq!(
            response.message,
            "400 BAD_REQUEST : code - 400 bad field: [alice]"
        );
        assert_eq!(response.data, Some(json!("BAD CMD")));
    }

    #[test]
    fn blank_principal_leaves_message_unmodified() {
        let frame = client_frame().with_principal("  ");
        let response =
            ResponseEnricher::for_client_failure(&RelayFailure::validation("bad field"), Some(&frame));
        assert_eq!(response.message, "400 BAD_REQUEST : code - 400 bad field");
    }

    #[test]
    fn without_client_frame_data_is_failure_message() {
        let response =
            ResponseEnricher::for_client_failure(&RelayFailure::access_denied("no token"), None);
        assert_eq!(response.status_code, 903);
        assert!(response.message.contains("Access has been denied"));
        assert_eq!(response.data, Some(json!("no token")));
    }

    #[test]
    fn generic_failure_keeps_default_status_code() {
        let failure = RelayFailure::other("broker went away").with_cause("EOF");
        let response = ResponseEnricher::for_client_failure(&failure, None);
        assert_eq!(response.status_code, 500);
        assert_eq!(response.message, "broker went away");
        assert_eq!(response.data, Some(json!("EOF")));
    }

    #[test]
    fn generic_failure_without_cause_clears_seeded_data() {
        let response =
            ResponseEnricher::for_client_failure(&RelayFailure::other("relay down"), None);
        assert_eq!(response.message, "relay down");
        assert_eq!(response.data, None);
    }

    #[test]
    fn generic_failure_without_message_keeps_default_message() {
        let failure = RelayFailure::Other {
            message: None,
            cause: None,
        };
        let response = ResponseEnricher::for_failure(&failure, None);
        assert_eq!(response, StructuredErrorResponse::failed());
    }

    #[test]
    fn detached_failure_is_annotated_from_context() {
        let context = ClientContext::for_session("s9").with_principal("bob");
        let response =
            ResponseEnricher::for_failure(&RelayFailure::access_denied("expired"), Some(&context));
        assert_eq!(
            response.message,
            "UNAUTHORIZED : [code - 401] expired, Access has been denied: [bob]"
        );
        assert_eq!(response.data, None);
    }

    #[test]
    fn broker_error_body_becomes_data() {
        let frame = StompFrame::new(StompCommand::Error).with_body("queue not found");
        let response = ResponseEnricher::for_broker_error(&frame);
        assert_eq!(response.status_code, 500);
        assert_eq!(response.data, Some(json!("queue not found")));
    }

    #[test]
    fn each_call_builds_a_fresh_response() {
        let frame = client_frame().with_principal("alice");
        let first =
            ResponseEnricher::for_client_failure(&RelayFailure::validation("a"), Some(&frame));
        let second = ResponseEnricher::for_client_failure(&RelayFailure::validation("b"), None);
        assert!(first.message.ends_with("a: [alice]"));
        assert_eq!(second.message, "400 BAD_REQUEST : code - 400 b");
    }
}
