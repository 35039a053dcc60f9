//! WebSocket adapters for STOMP client sessions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    ws_handler (per connection)                      │
//! │   - Decodes STOMP frames from WebSocket messages                    │
//! │   - ClientSession: CONNECT, principal, destination checks           │
//! │   - In-flow ERROR frames for rejected client frames                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                │ forwards                         ▲ enqueues
//!                ▼                                  │
//! ┌───────────────────────────┐        ┌───────────────────────────────┐
//! │        BrokerRelay        │───────▶│        SessionRegistry        │
//! │   shared upstream link    │ routes │   session id → outbound queue │
//! └───────────────────────────┘        └───────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`protocol`] - Per-connection STOMP session state
//! - [`sessions`] - Registry of live sessions, the [`OutboundChannel`](crate::ports::OutboundChannel)
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod protocol;
pub mod sessions;

pub use handler::{websocket_router, ws_handler, GatewayState, STOMP_SUBPROTOCOLS};
pub use protocol::{ClientSession, SessionAction, SERVER_NAME, STOMP_VERSION};
pub use sessions::SessionRegistry;
