//! Broker relay - the single upstream STOMP link shared by all client sessions.
//!
//! ```text
//! client sessions ──RelayHandle──▶ BrokerRelay ──BrokerLinkProvider──▶ broker node
//!        ▲                              │
//!        └────── OutboundChannel ◀──────┘  (MESSAGE / RECEIPT / wrapped ERROR)
//! ```
//!
//! - [`correlation`] - session namespacing of subscription ids and receipts
//! - [`subscriptions`] - active subscriptions, replayed after reconnect
//! - [`engine`] - the relay task and its handle

pub mod correlation;
pub mod engine;
pub mod subscriptions;

pub use engine::{BrokerRelay, RelayCommand, RelayError, RelayHandle};
pub use subscriptions::SubscriptionTable;
