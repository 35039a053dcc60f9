//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("No broker addresses configured")]
    NoBrokerAddresses,

    #[error("Broker address #{index} has an empty host")]
    EmptyBrokerHost { index: usize },

    #[error("Broker address #{index} has an invalid port")]
    InvalidBrokerPort { index: usize },

    #[error("WebSocket path must start with '/'")]
    InvalidWebSocketPath,

    #[error("Relay prefix '{0}' must start with '/'")]
    InvalidRelayPrefix(String),

    #[error("Channel capacity must be greater than zero")]
    InvalidChannelCapacity,

    #[error("Maximum frame size must be greater than zero")]
    InvalidMaxFrameSize,
}
