//! Round-robin pool of broker nodes.
//!
//! The pool is built once at startup and never mutated afterwards. The only
//! shared mutable state is the cursor, which is advanced atomically so that
//! many connection-open events can draw from the same pool concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{BrokerNode, PoolError};

/// Ordered, immutable set of broker nodes with an infinite cyclic cursor.
///
/// # Example
///
/// ```
/// use broker_gateway::domain::broker::{BrokerAddressPool, BrokerNode};
///
/// let pool = BrokerAddressPool::new(vec![
///     BrokerNode::new("a", 61613, false),
///     BrokerNode::new("b", 61614, true),
/// ])
/// .unwrap();
///
/// assert_eq!(pool.next().host(), "a");
/// assert_eq!(pool.next().host(), "b");
/// assert_eq!(pool.next().host(), "a");
/// ```
#[derive(Debug)]
pub struct BrokerAddressPool {
    nodes: Vec<BrokerNode>,
    security: SecurityMap,
    cursor: AtomicUsize,
}

impl BrokerAddressPool {
    /// Builds a pool from the configured node order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Empty`] if `nodes` is empty.
    pub fn new(nodes: Vec<BrokerNode>) -> Result<Self, PoolError> {
        if nodes.is_empty() {
            return Err(PoolError::Empty);
        }

        let security = SecurityMap::from_nodes(&nodes);

        Ok(Self {
            nodes,
            security,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Returns the node under the cursor and advances it by exactly one.
    pub fn next(&self) -> &BrokerNode {
        let len = self.nodes.len();
        // The closure never returns None, so fetch_update cannot fail.
        let position = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        };
        &self.nodes[position]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in configured order.
    pub fn nodes(&self) -> &[BrokerNode] {
        &self.nodes
    }

    pub fn security_map(&self) -> &SecurityMap {
        &self.security
    }
}

/// Transport-security lookup keyed by node identity.
///
/// Built alongside the pool so every pooled node has an entry.
#[derive(Debug, Clone, Default)]
pub struct SecurityMap {
    entries: HashMap<(String, u16), bool>,
}

impl SecurityMap {
    fn from_nodes(nodes: &[BrokerNode]) -> Self {
        let entries = nodes
            .iter()
            .map(|node| (node.identity(), node.is_secure()))
            .collect();
        Self { entries }
    }

    /// Whether the node should be reached over TLS.
    ///
    /// Unknown nodes are treated as plaintext.
    pub fn is_secure(&self, node: &BrokerNode) -> bool {
        self.entries
            .get(&(node.host().to_string(), node.port()))
            .copied()
            .unwrap_or(false)
    }

    pub fn contains(&self, node: &BrokerNode) -> bool {
        self.entries
            .contains_key(&(node.host().to_string(), node.port()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
