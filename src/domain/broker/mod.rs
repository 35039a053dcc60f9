//! Broker cluster model - the nodes a relay may connect to and the
//! round-robin pool that hands them out.

mod errors;
mod node;
mod pool;

pub use errors::PoolError;
pub use node::BrokerNode;
pub use pool::{BrokerAddressPool, SecurityMap};
