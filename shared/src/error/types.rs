//! Error types

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error type handed to the presentation layer:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (collection, record id, service code)
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a string detail
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.as_ref()?.get(key)?.as_str()
    }

    /// The backing service's own error code, when the error came from it
    pub fn service_code(&self) -> Option<&str> {
        self.detail_str("service_code")
    }

    /// Whether the presentation layer must replace the whole view
    pub fn is_blocking(&self) -> bool {
        self.code.category().is_blocking()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create a permission denied error
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    /// Create a reserved-record error
    pub fn reserved(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_message(
            ErrorCode::RecordReserved,
            format!("{} is managed automatically and cannot be edited", id),
        )
        .with_detail("record_id", id)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::with_message(ErrorCode::SubscriptionFailed, "orders feed failed")
            .with_detail("collection", "orders")
            .with_detail("service_code", "permission-denied");
        assert_eq!(err.detail_str("collection"), Some("orders"));
        assert_eq!(err.service_code(), Some("permission-denied"));
        assert!(!err.is_blocking());
    }

    #[test]
    fn test_reserved_carries_record_id() {
        let err = AppError::reserved("autoShipping");
        assert_eq!(err.code, ErrorCode::RecordReserved);
        assert_eq!(err.detail_str("record_id"), Some("autoShipping"));
    }

    #[test]
    fn test_session_errors_are_blocking() {
        assert!(AppError::new(ErrorCode::SessionFailed).is_blocking());
        assert!(!AppError::validation("bad").is_blocking());
    }
}
