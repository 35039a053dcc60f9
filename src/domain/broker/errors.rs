//! Error types for the broker pool.

use thiserror::Error;

/// Errors raised while building a [`super::BrokerAddressPool`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A relay with no upstream target cannot function.
    #[error("Broker address list is empty")]
    Empty,
}
