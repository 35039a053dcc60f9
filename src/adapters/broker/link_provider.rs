//! BrokerLinkProvider - the relay's single source of upstream connections.

use std::sync::Arc;

use crate::domain::broker::{BrokerAddressPool, BrokerNode};

use super::{BrokerStream, BrokerTarget, TlsConnectionFactory, TransportError};

/// An open connection and the node it goes to.
#[derive(Debug)]
pub struct BrokerLink {
    pub node: BrokerNode,
    pub stream: BrokerStream,
}

/// Composes the round-robin pool with the connection factory.
///
/// Invoked every time the relay opens or re-opens its shared upstream link.
/// Performs no retries: a failed attempt is returned to the caller, which
/// decides whether to ask for the next node.
pub struct BrokerLinkProvider {
    pool: Arc<BrokerAddressPool>,
    factory: TlsConnectionFactory,
}

impl BrokerLinkProvider {
    /// Creates a provider with a TLS factory built from the pool's security map.
    pub fn new(pool: Arc<BrokerAddressPool>) -> Result<Self, TransportError> {
        let factory = TlsConnectionFactory::new(pool.security_map().clone())?;
        Ok(Self::with_factory(pool, factory))
    }

    pub fn with_factory(pool: Arc<BrokerAddressPool>, factory: TlsConnectionFactory) -> Self {
        Self { pool, factory }
    }

    /// Picks the next node and builds its connection descriptor.
    pub fn acquire_next(&self) -> Result<BrokerTarget, TransportError> {
        let node = self.pool.next();
        tracing::info!(
            host = %node.host(),
            port = node.port(),
            secure = node.is_secure(),
            "Selected broker node for upstream link"
        );
        self.factory.build(node)
    }

    /// Picks the next node and connects to it.
    pub async fn open_next(&self) -> Result<BrokerLink, TransportError> {
        let target = self.acquire_next()?;
        let stream = target.connect().await?;
        Ok(BrokerLink {
            node: target.node().clone(),
            stream,
        })
    }

    pub fn pool(&self) -> &BrokerAddressPool {
        &self.pool
    }
}
