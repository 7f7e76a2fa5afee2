use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ProblemId, Status};

/// Errors produced by registry operations. A failed operation leaves the
/// registry untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("no problem registered under id {0:?}")]
    NotFound(ProblemId),
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: String,
    },
    #[error("status cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: Status, to: Status },
}

impl RegistryError {
    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    Validation,
    InvalidTransition,
    Internal,
}

/// Serializable error shape handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        let code = match &err {
            RegistryError::NotFound(_) => ErrorCode::NotFound,
            RegistryError::InvalidArgument { .. } => ErrorCode::Validation,
            RegistryError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        };
        Self::new(code, err.to_string())
    }
}
