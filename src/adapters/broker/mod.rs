//! Broker connection adapters.
//!
//! ```text
//! BrokerAddressPool ──next()──► TlsConnectionFactory ──build()──► BrokerTarget
//!         ▲                                                        │ connect()
//!         └──────────────── BrokerLinkProvider ◄───────────────────┘
//! ```
//!
//! The provider is the single entry point used by the relay each time it
//! opens or re-opens its upstream link.

mod errors;
mod link_provider;
mod stream;
mod tls_factory;

pub use errors::TransportError;
pub use link_provider::{BrokerLink, BrokerLinkProvider};
pub use stream::BrokerStream;
pub use tls_factory::{BrokerTarget, TlsConnectionFactory};
