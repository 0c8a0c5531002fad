// Structured outcome returned to callers that must never see an error value
// (CLI output, HTTP bodies, batch imports). Serializes as
// `{"success": true, ...data}` or `{"success": false, "error": ..., "code": ...}`.

use serde::Serialize;

use crate::error::{ErrorKind, LedgerError, Result};

#[derive(Debug, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip)]
    pub kind: Option<ErrorKind>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            kind: None,
        }
    }

    pub fn failure(err: &LedgerError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            code: Some(err.error_code()),
            kind: Some(err.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }
}
