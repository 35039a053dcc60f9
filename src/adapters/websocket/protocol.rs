//! Per-connection STOMP session state.

use crate::config::RelayConfig;
use crate::domain::failure::{ClientContext, RelayFailure};
use crate::domain::stomp::{headers, StompCommand, StompFrame};

pub const STOMP_VERSION: &str = "1.2";
pub const SERVER_NAME: &str = concat!("broker-gateway/", env!("CARGO_PKG_VERSION"));

/// What the connection handler should do with an accepted client frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Answer the client directly.
    Reply(StompFrame),
    /// Hand the (stamped) frame to the broker relay.
    Forward,
    /// Close the connection, after sending the receipt if one was asked for.
    Disconnect(Option<StompFrame>),
}

/// Protocol state of one client connection.
#[derive(Debug, Clone)]
pub struct ClientSession {
    id: String,
    principal: Option<String>,
    connected: bool,
}

impl ClientSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            principal: None,
            connected: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name the client asserted in its CONNECT `login` header.
    ///
    /// Not verified: the gateway does no client authentication and the broker
    /// only sees the relay's system login. The name labels error messages and
    /// is never written upstream.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Correlation for failures not tied to a particular frame.
    pub fn context(&self) -> ClientContext {
        let context = ClientContext::for_session(self.id.clone());
        match &self.principal {
            Some(name) => context.with_principal(name.clone()),
            None => context,
        }
    }

    /// Stamps `frame` with this session and decides what to do with it.
    ///
    /// Errors are failures to report back to the client in-flow.
    pub fn accept(
        &mut self,
        frame: &mut StompFrame,
        relay: &RelayConfig,
    ) -> Result<SessionAction, RelayFailure> {
        frame.session_id = Some(self.id.clone());
        frame.principal = self.principal.clone();

        if !frame.command.is_client_command() {
            return Err(RelayFailure::validation(format!(
                "Unexpected {} frame from client",
                frame.command
            )));
        }

        if frame.command.is_connect() {
            return self.connect(frame);
        }

        if !self.connected {
            return Err(RelayFailure::access_denied(format!(
                "{} frame received before CONNECT",
                frame.command
            )));
        }

        match frame.command {
            StompCommand::Disconnect => {
                self.connected = false;
                let receipt = frame.receipt().map(|receipt| {
                    StompFrame::new(StompCommand::Receipt)
                        .with_header(headers::RECEIPT_ID, receipt)
                        .with_session(self.id.clone())
                });
                Ok(SessionAction::Disconnect(receipt))
            }
            StompCommand::Send | StompCommand::Subscribe => {
                let destination = frame
                    .destination()
                    .ok_or_else(|| RelayFailure::validation("Missing destination header"))?;
                if !relay.is_relayed(destination) {
                    return Err(RelayFailure::validation(format!(
                        "No broker route for destination {destination}"
                    )));
                }
                if frame.command == StompCommand::Subscribe {
                    require_id(frame)?;
                }
                Ok(SessionAction::Forward)
            }
            StompCommand::Unsubscribe => {
                require_id(frame)?;
                Ok(SessionAction::Forward)
            }
            _ => Ok(SessionAction::Forward),
        }
    }

    fn connect(&mut self, frame: &mut StompFrame) -> Result<SessionAction, RelayFailure> {
        if self.connected {
            return Err(RelayFailure::validation("Session is already connected"));
        }

        if let Some(versions) = frame.header(headers::ACCEPT_VERSION) {
            if !versions.split(',').any(|v| v.trim() == STOMP_VERSION) {
                return Err(RelayFailure::validation(format!(
                    "Unsupported protocol versions {versions}"
                )));
            }
        }

        // Client-asserted; any passcode is ignored.
        self.principal = frame
            .header(headers::LOGIN)
            .filter(|login| !login.trim().is_empty())
            .map(str::to_string);
        self.connected = true;
        frame.principal = self.principal.clone();

        tracing::info!(
            session_id = %self.id,
            principal = ?self.principal,
            "Client session connected"
        );

        let mut connected = StompFrame::new(StompCommand::Connected)
            .with_header(headers::VERSION, STOMP_VERSION)
            .with_header(headers::HEART_BEAT, "0,0")
            .with_header("server", SERVER_NAME)
            .with_header("session", self.id.clone())
            .with_session(self.id.clone());
        if let Some(name) = &self.principal {
            connected.set_header("user-name", name.clone());
        }
        Ok(SessionAction::Reply(connected))
    }
}

fn require_id(frame: &StompFrame) -> Result<(), RelayFailure> {
    match frame.header(headers::ID) {
        Some(id) if !id.is_empty() => Ok(()),
        _ => Err(RelayFailure::validation("Missing id header")),
    }
}
