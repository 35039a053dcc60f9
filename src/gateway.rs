//! Wiring of the gateway: configuration in, running WebSocket server out.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::adapters::broker::{BrokerLinkProvider, TransportError};
use crate::adapters::relay::{BrokerRelay, RelayHandle};
use crate::adapters::serialization::JsonResponseCodec;
use crate::adapters::websocket::{websocket_router, GatewayState, SessionRegistry};
use crate::application::{ErrorDispatcher, SafeSerializer};
use crate::config::{AppConfig, ValidationError};

/// Errors that stop the gateway from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("Broker transport setup failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// A fully wired gateway, not yet listening.
pub struct Gateway {
    pub router: Router,
    pub sessions: Arc<SessionRegistry>,
    pub relay: RelayHandle,
    pub relay_task: JoinHandle<()>,
}

/// Builds every component and starts the broker relay.
///
/// Must be called from within a Tokio runtime.
pub fn build(config: &AppConfig) -> Result<Gateway, StartupError> {
    config.validate()?;

    let pool = Arc::new(config.broker.build_pool()?);
    let provider = Arc::new(BrokerLinkProvider::new(pool)?);

    let sessions = Arc::new(SessionRegistry::new());
    let serializer = SafeSerializer::new(Arc::new(JsonResponseCodec));
    let dispatcher = Arc::new(ErrorDispatcher::new(serializer, sessions.clone()));

    let (relay, relay_task) = BrokerRelay::new(
        provider,
        config.broker.relay.clone(),
        sessions.clone(),
        dispatcher.clone(),
    )
    .spawn();

    let state = GatewayState {
        sessions: sessions.clone(),
        dispatcher,
        relay: relay.clone(),
        relay_config: Arc::new(config.broker.relay.clone()),
        session_buffer: config.server.session_buffer,
    };

    let router = websocket_router(&config.server.websocket_path)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    Ok(Gateway {
        router,
        sessions,
        relay,
        relay_task,
    })
}

/// Serves the gateway until `shutdown` resolves.
pub async fn run<F>(config: AppConfig, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.server.socket_addr()?;
    let gateway = build(&config)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        %addr,
        path = %config.server.websocket_path,
        brokers = config.broker.addresses.len(),
        "Broker gateway listening"
    );

    let served = axum::serve(listener, gateway.router)
        .with_graceful_shutdown(shutdown)
        .await;

    gateway.relay_task.abort();
    served.map_err(StartupError::Serve)
}
