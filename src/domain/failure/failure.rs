//! Failures that can reach a client.

use thiserror::Error;

use crate::domain::stomp::FrameError;

/// Semantic classification of a failure.
///
/// Closed set; a new category must be added here explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    AccessDenied,
    Validation,
    Generic,
}

impl ErrorCategory {
    /// AccessDenied and Validation failures are attributable to the client.
    pub fn is_attributable(&self) -> bool {
        !matches!(self, ErrorCategory::Generic)
    }
}

/// Any failure raised while handling a client frame or relaying a broker frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayFailure {
    /// The client is not allowed to perform the action.
    #[error("{message}")]
    AccessDenied { message: String },

    /// The client sent something semantically or syntactically invalid.
    #[error("{message}")]
    Validation { message: String },

    /// Anything else. `cause` is the underlying error, if known.
    #[error("{}", .message.as_deref().unwrap_or("Unknown failure"))]
    Other {
        message: Option<String>,
        cause: Option<String>,
    },
}

impl RelayFailure {
    pub fn access_denied(message: impl Into<String>) -> Self {
        RelayFailure::AccessDenied {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RelayFailure::Validation {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        RelayFailure::Other {
            message: Some(message.into()),
            cause: None,
        }
    }

    /// Wraps an error, keeping its source chain as the cause.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        RelayFailure::Other {
            message: Some(err.to_string()),
            cause: err.source().map(|source| source.to_string()),
        }
    }

    pub fn with_cause(self, cause: impl Into<String>) -> Self {
        match self {
            RelayFailure::Other { message, .. } => RelayFailure::Other {
                message,
                cause: Some(cause.into()),
            },
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayFailure::AccessDenied { .. } => ErrorCategory::AccessDenied,
            RelayFailure::Validation { .. } => ErrorCategory::Validation,
            RelayFailure::Other { .. } => ErrorCategory::Generic,
        }
    }

    /// Original message text, if the failure carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            RelayFailure::AccessDenied { message } | RelayFailure::Validation { message } => {
                Some(message)
            }
            RelayFailure::Other { message, .. } => message.as_deref(),
        }
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            RelayFailure::Other { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }
}

impl From<FrameError> for RelayFailure {
    fn from(err: FrameError) -> Self {
        RelayFailure::validation(err.to_string())
    }
}
