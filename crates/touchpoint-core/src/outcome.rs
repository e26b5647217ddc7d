use serde::{Deserialize, Serialize};

use crate::{ErrorCode, TouchpointError};

/// How the host engine should treat an action result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Action completed.
    Ok,
    /// Action degraded but installation may continue.
    Warning,
    /// Action failed.
    Error,
}

/// Result reported back to the host for `execute` and `undo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Overall severity.
    pub severity: Severity,
    /// Failure category when not OK.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Human-readable summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Underlying cause, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            severity: Severity::Ok,
            code: None,
            message: None,
            detail: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity == Severity::Ok
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Permission problems let the host continue; everything else stops it.
impl From<TouchpointError> for Outcome {
    fn from(err: TouchpointError) -> Self {
        let severity = match err.code {
            ErrorCode::PermissionDenied => Severity::Warning,
            _ => Severity::Error,
        };

        Self {
            severity,
            code: Some(err.code),
            message: Some(err.message),
            detail: err.detail,
        }
    }
}

impl<T> From<Result<T, TouchpointError>> for Outcome {
    fn from(result: Result<T, TouchpointError>) -> Self {
        match result {
            Ok(_) => Outcome::ok(),
            Err(err) => err.into(),
        }
    }
}
