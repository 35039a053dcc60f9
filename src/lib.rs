//! Broker Gateway - STOMP over WebSocket, relayed to a broker cluster.
//!
//! Client sessions share one upstream link to a round-robin pool of broker
//! nodes (plain TCP or TLS per node). Failures anywhere along the way reach
//! the client as frames carrying a JSON `StructuredErrorResponse`.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod ports;
