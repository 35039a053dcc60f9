//! Domain layer: broker cluster model, STOMP frames and failure translation.
//!
//! # Module Organization
//!
//! - `broker` - Broker nodes and the round-robin address pool
//! - `stomp` - STOMP frame type and text codec
//! - `failure` - Failure classification and the structured error payload

pub mod broker;
pub mod failure;
pub mod stomp;
