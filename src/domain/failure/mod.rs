//! Failure classification and the structured error payload sent to clients.
//!
//! # Pipeline
//!
//! ```text
//! RelayFailure ──► ErrorClassifier ──► ResponseEnricher ──► StructuredErrorResponse
//!                  (category, code,     (client payload,
//!                   message template)    principal name)
//! ```
//!
//! Everything here is pure: no I/O, no shared state.

mod classifier;
mod context;
mod enricher;
mod failure;
mod response;

pub use classifier::{Classification, ErrorClassifier, ACCESS_DENIED_STATUS, VALIDATION_STATUS};
pub use context::ClientContext;
pub use enricher::ResponseEnricher;
pub use failure::{ErrorCategory, RelayFailure};
pub use response::{StructuredErrorResponse, DEFAULT_STATUS, DEFAULT_STATUS_CODE, FAILED_STATUS};
