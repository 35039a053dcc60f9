//! Broker cluster configuration

use serde::Deserialize;

use crate::domain::broker::{BrokerAddressPool, BrokerNode, PoolError};

use super::error::ValidationError;
use super::relay::RelayConfig;

/// Broker cluster configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerConfig {
    /// Broker nodes in round-robin order
    #[serde(default)]
    pub addresses: Vec<BrokerAddress>,

    /// Upstream relay settings
    #[serde(default)]
    pub relay: RelayConfig,
}

/// One configured broker endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,

    /// Connect over TLS
    #[serde(default)]
    pub ssl: bool,
}

impl BrokerConfig {
    /// Broker nodes in configured order
    pub fn nodes(&self) -> Vec<BrokerNode> {
        self.addresses
            .iter()
            .map(|address| BrokerNode::new(address.host.clone(), address.port, address.ssl))
            .collect()
    }

    /// Build the round-robin pool from the configured addresses
    pub fn build_pool(&self) -> Result<BrokerAddressPool, ValidationError> {
        let nodes = self.nodes();
        for node in &nodes {
            tracing::info!(
                host = %node.host(),
                port = node.port(),
                secure = node.is_secure(),
                "Adding STOMP broker to the cluster list"
            );
        }

        BrokerAddressPool::new(nodes).map_err(|err| match err {
            PoolError::Empty => ValidationError::NoBrokerAddresses,
        })
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.addresses.is_empty() {
            return Err(ValidationError::NoBrokerAddresses);
        }
        for (index, address) in self.addresses.iter().enumerate() {
            if address.host.trim().is_empty() {
                return Err(ValidationError::EmptyBrokerHost { index });
            }
            if address.port == 0 {
                return Err(ValidationError::InvalidBrokerPort { index });
            }
        }
        self.relay.validate()
    }
}
