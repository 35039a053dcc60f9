//! Maps a failure to its category, status code and message template.

use http::StatusCode;
use serde_json::Value;

use super::{ErrorCategory, RelayFailure};

/// Status code reported for access-denied failures.
pub const ACCESS_DENIED_STATUS: i32 = 903;
/// Status code reported for validation failures.
pub const VALIDATION_STATUS: i32 = 400;

/// Outcome of classifying a failure.
///
/// `None` fields leave the corresponding response field untouched. `data` is
/// `Some(None)` when the response data must be cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub status_code: Option<i32>,
    pub message: Option<String>,
    pub data: Option<Option<Value>>,
}

/// Stateless classifier.
///
/// | Failure       | Status            | Message                                                      |
/// |---------------|-------------------|--------------------------------------------------------------|
/// | AccessDenied  | 903               | `UNAUTHORIZED : [code - 401] <msg>, Access has been denied`  |
/// | Validation    | 400               | `400 BAD_REQUEST : code - 400 <msg>`                         |
/// | Other         | unchanged         | `<msg>`, data set to the cause (null when unknown)           |
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(failure: &RelayFailure) -> Classification {
        let original = failure.message().unwrap_or_default();

        match failure.category() {
            ErrorCategory::AccessDenied => {
                let status = StatusCode::UNAUTHORIZED;
                Classification {
                    category: ErrorCategory::AccessDenied,
                    status_code: Some(ACCESS_DENIED_STATUS),
                    message: Some(format!(
                        "{} : [code - {}] {}, Access has been denied",
                        status_name(status),
                        status.as_u16(),
                        original
                    )),
                    data: None,
                }
            }
            ErrorCategory::Validation => {
                let status = StatusCode::BAD_REQUEST;
                Classification {
                    category: ErrorCategory::Validation,
                    status_code: Some(VALIDATION_STATUS),
                    message: Some(format!(
                        "{} {} : code - {} {}",
                        status.as_u16(),
                        status_name(status),
                        status.as_u16(),
                        original
                    )),
                    data: None,
                }
            }
            ErrorCategory::Generic => Classification {
                category: ErrorCategory::Generic,
                status_code: None,
                message: failure.message().map(str::to_string),
                data: Some(failure.cause().map(|cause| Value::String(cause.to_string()))),
            },
        }
    }
}

/// `Bad Request` -> `BAD_REQUEST`.
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
        .replace(' ', "_")
}
