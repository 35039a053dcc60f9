//! Structured error payload delivered to clients.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_STATUS_CODE: i32 = 500;
pub const DEFAULT_STATUS: &str = "Failed Message";
/// Status text for non-attributable failures pushed as MESSAGE frames.
pub const FAILED_STATUS: &str = "Failed";

/// Wire shape: `{"statusCode":int,"status":string,"message":string,"data":any|null}`.
///
/// A fresh value is built per failure and dropped once serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredErrorResponse {
    pub status_code: i32,
    pub status: String,
    pub message: String,
    pub data: Option<Value>,
}

impl StructuredErrorResponse {
    /// The default response every failure starts from.
    pub fn failed() -> Self {
        Self {
            status_code: DEFAULT_STATUS_CODE,
            status: DEFAULT_STATUS.to_string(),
            message: DEFAULT_STATUS.to_string(),
            data: None,
        }
    }
}

impl Default for StructuredErrorResponse {
    fn default() -> Self {
        Self::failed()
    }
}

impl fmt::Display for StructuredErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StructuredErrorResponse(statusCode={}, status={}, message={}, data=",
            self.status_code, self.status, self.message
        )?;
        match &self.data {
            Some(Value::String(text)) => write!(f, "{})", text),
            Some(other) => write!(f, "{})", other),
            None => write!(f, "null)"),
        }
    }
}
