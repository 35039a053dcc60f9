//! Transport errors for broker connections.

use std::io;

use thiserror::Error;

use crate::domain::failure::RelayFailure;

/// Failure to reach a broker node. Fatal to that attempt only.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("TLS configuration failed: {0}")]
    TlsConfig(#[from] rustls::Error),

    #[error("Invalid TLS server name '{host}'")]
    InvalidServerName { host: String },

    #[error("Failed to connect to broker {node}: {source}")]
    Connect {
        node: String,
        #[source]
        source: io::Error,
    },

    #[error("TLS handshake with broker {node} failed: {source}")]
    Handshake {
        node: String,
        #[source]
        source: io::Error,
    },
}

impl From<TransportError> for RelayFailure {
    fn from(err: TransportError) -> Self {
        RelayFailure::from_error(&err)
    }
}
