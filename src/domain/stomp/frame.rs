//! STOMP frame value type.

use super::StompCommand;

/// Well-known header names.
pub mod headers {
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const DESTINATION: &str = "destination";
    pub const HEART_BEAT: &str = "heart-beat";
    pub const HOST: &str = "host";
    pub const ID: &str = "id";
    pub const LOGIN: &str = "login";
    pub const MESSAGE: &str = "message";
    pub const PASSCODE: &str = "passcode";
    pub const RECEIPT: &str = "receipt";
    pub const RECEIPT_ID: &str = "receipt-id";
    pub const SUBSCRIPTION: &str = "subscription";
    pub const TRANSACTION: &str = "transaction";
    pub const VERSION: &str = "version";
}

/// A STOMP frame plus the routing attributes the gateway attaches to it.
///
/// Headers keep their wire order. Lookups return the first occurrence, as
/// STOMP 1.2 requires for repeated headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Client session the frame belongs to. Not written to the wire.
    pub session_id: Option<String>,
    /// Principal name the session asserted at CONNECT. Not written to the wire.
    pub principal: Option<String>,
}

impl StompFrame {
    /// Creates an empty frame for `command`.
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: Vec::new(),
            session_id: None,
            principal: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }

    /// First value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces every occurrence of `name` with a single value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter().position(|(key, _)| *key == name) {
            Some(index) => {
                self.headers[index].1 = value;
                let mut seen = false;
                self.headers.retain(|(key, _)| {
                    if *key != name {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.headers.push((name, value)),
        }
    }

    /// Removes every occurrence of `name`, returning the first value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let first = self.header(name).map(str::to_string);
        self.headers.retain(|(key, _)| key != name);
        first
    }

    /// Client-requested receipt (`receipt` header).
    pub fn receipt(&self) -> Option<&str> {
        self.header(headers::RECEIPT)
    }

    /// Receipt being acknowledged (`receipt-id` header).
    pub fn receipt_id(&self) -> Option<&str> {
        self.header(headers::RECEIPT_ID)
    }

    pub fn destination(&self) -> Option<&str> {
        self.header(headers::DESTINATION)
    }

    /// Short error description on ERROR frames.
    pub fn message(&self) -> Option<&str> {
        self.header(headers::MESSAGE)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
