//! Observable state of a single fetch.

use serde::Serialize;

use crate::error::ApiError;

/// Exactly one of pending, resolved or failed. A fetch cycle moves from
/// `Pending` to one of the other two; a refetch starts a new cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "payload", rename_all = "lowercase")]
pub enum OperationResult<T> {
    Pending,
    Resolved(T),
    Failed(String),
}

impl<T> OperationResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, OperationResult::Pending)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            OperationResult::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResult<U> {
        match self {
            OperationResult::Pending => OperationResult::Pending,
            OperationResult::Resolved(value) => OperationResult::Resolved(f(value)),
            OperationResult::Failed(message) => OperationResult::Failed(message),
        }
    }
}

impl<T> From<Result<T, ApiError>> for OperationResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => OperationResult::Resolved(value),
            Err(e) => OperationResult::Failed(e.to_string()),
        }
    }
}
