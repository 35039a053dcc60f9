//! A single configured broker endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One broker node of the cluster.
///
/// Identity is `(host, port)`; the `secure` flag only selects the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrokerNode {
    host: String,
    port: u16,
    secure: bool,
}

impl BrokerNode {
    /// Creates a new broker node.
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Returns the `(host, port)` identity of this node.
    pub fn identity(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl fmt::Display for BrokerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
