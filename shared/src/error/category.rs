//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Session errors
/// - 2xxx: Permission errors
/// - 3xxx: Subscription errors
/// - 4xxx: Mutation errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Session errors (1xxx)
    Session,
    /// Permission errors (2xxx)
    Permission,
    /// Live subscription errors (3xxx)
    Subscription,
    /// Mutation errors (4xxx)
    Mutation,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Session,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Subscription,
            4000..5000 => Self::Mutation,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Session => "session",
            Self::Permission => "permission",
            Self::Subscription => "subscription",
            Self::Mutation => "mutation",
            Self::System => "system",
        }
    }

    /// Whether an error of this category blocks the whole dashboard
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Session)
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
