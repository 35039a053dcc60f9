//! Upstream relay configuration

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;

/// Settings for the shared upstream broker link
#[derive(Clone, Deserialize)]
pub struct RelayConfig {
    /// Login of the relay's own broker session
    #[serde(default = "default_credential")]
    pub system_login: String,

    /// Passcode of the relay's own broker session
    #[serde(default = "default_credential")]
    pub system_passcode: String,

    /// Virtual host sent in the CONNECT frame
    #[serde(default = "default_virtual_host")]
    pub virtual_host: String,

    /// Heart-beat the relay offers to send, in milliseconds
    #[serde(default = "default_heartbeat")]
    pub heartbeat_send_ms: u64,

    /// Heart-beat the relay wants to receive, in milliseconds
    #[serde(default = "default_heartbeat")]
    pub heartbeat_receive_ms: u64,

    /// Destination prefixes forwarded to the broker
    #[serde(default = "default_relay_prefixes")]
    pub relay_prefixes: Vec<String>,

    /// Pause before asking for the next broker after a lost link
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Client frames buffered towards the upstream link
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Largest broker frame accepted, in bytes. Larger frames are dropped.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
}

impl RelayConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Value of the STOMP `heart-beat` header, `send,receive`
    pub fn heartbeat_header(&self) -> String {
        format!("{},{}", self.heartbeat_send_ms, self.heartbeat_receive_ms)
    }

    /// Whether `destination` is handled by the broker
    pub fn is_relayed(&self, destination: &str) -> bool {
        self.relay_prefixes
            .iter()
            .any(|prefix| destination.starts_with(prefix.as_str()))
    }

    /// Validate relay configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.system_login.is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_GATEWAY__BROKER__RELAY__SYSTEM_LOGIN"));
        }
        if let Some(prefix) = self.relay_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ValidationError::InvalidRelayPrefix(prefix.clone()));
        }
        if self.channel_capacity == 0 {
            return Err(ValidationError::InvalidChannelCapacity);
        }
        if self.max_frame_size == 0 {
            return Err(ValidationError::InvalidMaxFrameSize);
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            system_login: default_credential(),
            system_passcode: default_credential(),
            virtual_host: default_virtual_host(),
            heartbeat_send_ms: default_heartbeat(),
            heartbeat_receive_ms: default_heartbeat(),
            relay_prefixes: default_relay_prefixes(),
            reconnect_delay_ms: default_reconnect_delay(),
            channel_capacity: default_channel_capacity(),
            max_frame_size: default_max_frame_size(),
        }
    }
}

// Passcode stays out of logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("system_login", &self.system_login)
            .field("system_passcode", &"[REDACTED]")
            .field("virtual_host", &self.virtual_host)
            .field("heartbeat_send_ms", &self.heartbeat_send_ms)
            .field("heartbeat_receive_ms", &self.heartbeat_receive_ms)
            .field("relay_prefixes", &self.relay_prefixes)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .field("channel_capacity", &self.channel_capacity)
            .field("max_frame_size", &self.max_frame_size)
            .finish()
    }
}

fn default_credential() -> String {
    "guest".to_string()
}

fn default_virtual_host() -> String {
    "/".to_string()
}

fn default_heartbeat() -> u64 {
    10_000
}

fn default_relay_prefixes() -> Vec<String> {
    vec!["/topic".to_string(), "/queue".to_string()]
}

fn default_reconnect_delay() -> u64 {
    5_000
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_max_frame_size() -> usize {
    16 * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.system_login, "guest");
        assert_eq!(config.virtual_host, "/");
        assert_eq!(config.heartbeat_header(), "10000,10000");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.max_frame_size, 16 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_relayed() {
        let config = RelayConfig::default();
        assert!(config.is_relayed("/topic/prices"));
        assert!(config.is_relayed("/queue/orders"));
        assert!(!config.is_relayed("/api/orders"));
    }

    #[test]
    fn test_debug_redacts_passcode() {
        let config = RelayConfig {
            system_passcode: "hunter2".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_validation_relay_prefix() {
        let config = RelayConfig {
            relay_prefixes: vec!["topic".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidRelayPrefix("topic".to_string()))
        );
    }

    #[test]
    fn test_validation_channel_capacity() {
        let config = RelayConfig {
            channel_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidChannelCapacity));
    }

    #[test]
    fn test_validation_max_frame_size() {
        let config = RelayConfig {
            max_frame_size: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxFrameSize));
    }
}
