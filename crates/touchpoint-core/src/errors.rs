use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingParameter,
    PersistenceFailure,
    PermissionDenied,
    IoFailure,
    UnknownAction,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct TouchpointError {
    pub code: ErrorCode,
    pub message: String,
    pub detail: Option<String>,
}

impl TouchpointError {
    pub fn missing_parameter(name: &str) -> Self {
        Self {
            code: ErrorCode::MissingParameter,
            message: format!("required parameter '{name}' is missing"),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
