//! Builds connection descriptors, wrapping secure nodes in TLS.

use std::fmt;
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::domain::broker::{BrokerNode, SecurityMap};

use super::{BrokerStream, TransportError};

/// Produces a [`BrokerTarget`] per node, applying TLS only where flagged.
///
/// TLS uses the default webpki root store; there is no per-node pinning.
/// A node flagged secure never falls back to plaintext.
#[derive(Clone)]
pub struct TlsConnectionFactory {
    security: SecurityMap,
    tls_config: Arc<ClientConfig>,
}

impl TlsConnectionFactory {
    /// Creates a factory deciding security from `security`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::TlsConfig`] if the client TLS configuration
    /// cannot be built.
    pub fn new(security: SecurityMap) -> Result<Self, TransportError> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let tls_config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            security,
            tls_config: Arc::new(tls_config),
        })
    }

    /// Descriptor pointed at `node`, TLS-wrapped if the node is secure.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidServerName`] if a secure node's host
    /// cannot be used as a TLS server name.
    pub fn build(&self, node: &BrokerNode) -> Result<BrokerTarget, TransportError> {
        let tls = if self.security.is_secure(node) {
            let server_name = ServerName::try_from(node.host().to_string()).map_err(|_| {
                TransportError::InvalidServerName {
                    host: node.host().to_string(),
                }
            })?;
            Some(TlsWrapper {
                connector: TlsConnector::from(Arc::clone(&self.tls_config)),
                server_name,
            })
        } else {
            None
        };

        Ok(BrokerTarget {
            node: node.clone(),
            tls,
        })
    }
}

/// Client-side security layer for one node.
#[derive(Clone)]
struct TlsWrapper {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

/// Where and how to connect to a broker node.
#[derive(Clone)]
pub struct BrokerTarget {
    node: BrokerNode,
    tls: Option<TlsWrapper>,
}

impl BrokerTarget {
    pub fn node(&self) -> &BrokerNode {
        &self.node
    }

    /// Whether the descriptor carries a TLS wrapper.
    pub fn is_secure(&self) -> bool {
        self.tls.is_some()
    }

    /// Opens the TCP connection and, for secure targets, runs the TLS handshake.
    ///
    /// No timeout is applied here; the caller owns cancellation.
    pub async fn connect(&self) -> Result<BrokerStream, TransportError> {
        let tcp = TcpStream::connect((self.node.host(), self.node.port()))
            .await
            .map_err(|source| TransportError::Connect {
                node: self.node.to_string(),
                source,
            })?;

        let Some(tls) = &self.tls else {
            return Ok(BrokerStream::Plain(tcp));
        };

        let stream = tls
            .connector
            .connect(tls.server_name.clone(), tcp)
            .await
            .map_err(|source| TransportError::Handshake {
                node: self.node.to_string(),
                source,
            })?;
        Ok(BrokerStream::Tls(Box::new(stream)))
    }
}

impl fmt::Debug for BrokerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerTarget")
            .field("node", &self.node)
            .field("secure", &self.is_secure())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::broker::BrokerAddressPool;
    use tokio::net::TcpListener;

    fn factory_for(nodes: Vec<BrokerNode>) -> (BrokerAddressPool, TlsConnectionFactory) {
        let pool = BrokerAddressPool::new(nodes).unwrap();
        let factory = TlsConnectionFactory::new(pool.security_map().clone()).unwrap();
        (pool, factory)
    }

    #[test]
    fn wraps_only_secure_nodes() {
        let (pool, factory) = factory_for(vec![
            BrokerNode::new("rabbit-1.example.com", 61614, true),
            BrokerNode::new("rabbit-2.example.com", 61613, false),
            BrokerNode::new("10.0.0.7", 61614, true),
        ]);

        for node in pool.nodes() {
            let target = factory.build(node).unwrap();
            assert_eq!(target.is_secure(), node.is_secure(), "node {}", node);
            assert_eq!(target.node(), node);
        }
    }

    #[test]
    fn invalid_server_name_is_an_error_not_plaintext() {
        let (pool, factory) = factory_for(vec![BrokerNode::new("not a host", 61614, true)]);

        let err = factory.build(pool.next()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidServerName { host } if host == "not a host"));
    }

    #[test]
    fn plaintext_node_accepts_any_host_string() {
        let (pool, factory) = factory_for(vec![BrokerNode::new("not a host", 61613, false)]);
        assert!(!factory.build(pool.next()).unwrap().is_secure());
    }

    #[tokio::test]
    async fn connects_to_plaintext_node() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (pool, factory) = factory_for(vec![BrokerNode::new("127.0.0.1", port, false)]);

        let target = factory.build(pool.next()).unwrap();
        let (stream, accepted) = tokio::join!(target.connect(), listener.accept());

        assert!(!stream.unwrap().is_secure());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let (pool, factory) = factory_for(vec![BrokerNode::new("127.0.0.1", port, false)]);
        let err = factory.build(pool.next()).unwrap().connect().await.unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
    }
}
