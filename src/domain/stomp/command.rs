//! STOMP commands.

use std::fmt;
use std::str::FromStr;

use super::FrameError;

/// Every client and server command defined by STOMP 1.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StompCommand {
    // Client commands
    Connect,
    Stomp,
    Send,
    Subscribe,
    Unsubscribe,
    Ack,
    Nack,
    Begin,
    Commit,
    Abort,
    Disconnect,

    // Server commands
    Connected,
    Message,
    Receipt,
    Error,
}

impl StompCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            StompCommand::Connect => "CONNECT",
            StompCommand::Stomp => "STOMP",
            StompCommand::Send => "SEND",
            StompCommand::Subscribe => "SUBSCRIBE",
            StompCommand::Unsubscribe => "UNSUBSCRIBE",
            StompCommand::Ack => "ACK",
            StompCommand::Nack => "NACK",
            StompCommand::Begin => "BEGIN",
            StompCommand::Commit => "COMMIT",
            StompCommand::Abort => "ABORT",
            StompCommand::Disconnect => "DISCONNECT",
            StompCommand::Connected => "CONNECTED",
            StompCommand::Message => "MESSAGE",
            StompCommand::Receipt => "RECEIPT",
            StompCommand::Error => "ERROR",
        }
    }

    /// CONNECT, STOMP and CONNECTED frames do not escape header values.
    pub fn escapes_headers(&self) -> bool {
        !matches!(
            self,
            StompCommand::Connect | StompCommand::Stomp | StompCommand::Connected
        )
    }

    /// Commands that open a session.
    pub fn is_connect(&self) -> bool {
        matches!(self, StompCommand::Connect | StompCommand::Stomp)
    }

    /// Commands a client is allowed to send.
    pub fn is_client_command(&self) -> bool {
        !matches!(
            self,
            StompCommand::Connected
                | StompCommand::Message
                | StompCommand::Receipt
                | StompCommand::Error
        )
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StompCommand {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "CONNECT" => StompCommand::Connect,
            "STOMP" => StompCommand::Stomp,
            "SEND" => StompCommand::Send,
            "SUBSCRIBE" => StompCommand::Subscribe,
            "UNSUBSCRIBE" => StompCommand::Unsubscribe,
            "ACK" => StompCommand::Ack,
            "NACK" => StompCommand::Nack,
            "BEGIN" => StompCommand::Begin,
            "COMMIT" => StompCommand::Commit,
            "ABORT" => StompCommand::Abort,
            "DISCONNECT" => StompCommand::Disconnect,
            "CONNECTED" => StompCommand::Connected,
            "MESSAGE" => StompCommand::Message,
            "RECEIPT" => StompCommand::Receipt,
            "ERROR" => StompCommand::Error,
            other => return Err(FrameError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_every_command() {
        for name in [
            "CONNECT",
            "STOMP",
            "SEND",
            "SUBSCRIBE",
            "UNSUBSCRIBE",
            "ACK",
            "NACK",
            "BEGIN",
            "COMMIT",
            "ABORT",
            "DISCONNECT",
            "CONNECTED",
            "MESSAGE",
            "RECEIPT",
            "ERROR",
        ] {
            let command: StompCommand = name.parse().unwrap();
            assert_eq!(command.to_string(), name);
        }
    }

    #[test]
    fn rejects_lowercase_command() {
        assert_eq!(
            "send".parse::<StompCommand>(),
            Err(FrameError::UnknownCommand("send".to_string()))
        );
    }

    #[test]
    fn connect_frames_do_not_escape() {
        assert!(!StompCommand::Connect.escapes_headers());
        assert!(!StompCommand::Connected.escapes_headers());
        assert!(StompCommand::Error.escapes_headers());
    }

    #[test]
    fn server_commands_are_not_client_commands() {
        assert!(StompCommand::Send.is_client_command());
        assert!(!StompCommand::Message.is_client_command());
        assert!(!StompCommand::Error.is_client_command());
    }
}
