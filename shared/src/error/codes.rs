//! Unified error codes for LeatherCraft HQ
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Session / authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Live subscription errors
//! - 4xxx: Mutation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Session ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Anonymous sign-in or session restore failed
    SessionFailed = 1002,
    /// Service API key rejected
    ApiKeyInvalid = 1003,
    /// Sign-in method not enabled on the service
    AuthNotConfigured = 1004,
    /// Session ended while an operation was in flight
    SessionEnded = 1005,

    // ==================== 2xxx: Permission ====================
    /// Permission denied by service security rules
    PermissionDenied = 2001,
    /// Record is owned by the system and cannot be edited directly
    RecordReserved = 2002,

    // ==================== 3xxx: Subscription ====================
    /// Live subscription to a collection failed
    SubscriptionFailed = 3001,
    /// Live subscription closed by the service
    SubscriptionClosed = 3002,

    // ==================== 4xxx: Mutation ====================
    /// Create/update/delete rejected or failed
    MutationFailed = 4001,
    /// Automated shipping expense could not be written
    ShippingSyncFailed = 4002,
    /// Order has no valid line items
    OrderEmpty = 4003,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Backing service unavailable
    ServiceUnavailable = 9002,
    /// Network error
    NetworkError = 9003,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::SessionFailed => "Could not establish a session",
            ErrorCode::ApiKeyInvalid => "Service API key is not valid",
            ErrorCode::AuthNotConfigured => "Authentication is not enabled on the service",
            ErrorCode::SessionEnded => "Session has ended",

            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RecordReserved => "Record is managed automatically and cannot be edited",

            ErrorCode::SubscriptionFailed => "Live subscription failed",
            ErrorCode::SubscriptionClosed => "Live subscription closed",

            ErrorCode::MutationFailed => "Could not save changes",
            ErrorCode::ShippingSyncFailed => "Could not update automated shipping costs",
            ErrorCode::OrderEmpty => "Order has no valid products",

            ErrorCode::InternalError => "Internal error",
            ErrorCode::ServiceUnavailable => "Service unavailable",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::SessionFailed),
            1003 => Ok(ErrorCode::ApiKeyInvalid),
            1004 => Ok(ErrorCode::AuthNotConfigured),
            1005 => Ok(ErrorCode::SessionEnded),

            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RecordReserved),

            3001 => Ok(ErrorCode::SubscriptionFailed),
            3002 => Ok(ErrorCode::SubscriptionClosed),

            4001 => Ok(ErrorCode::MutationFailed),
            4002 => Ok(ErrorCode::ShippingSyncFailed),
            4003 => Ok(ErrorCode::OrderEmpty),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::ServiceUnavailable),
            9003 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
