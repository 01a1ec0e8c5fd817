//! Unified error system for LeatherCraft HQ
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ErrorNotice`]: Title/message/steps for blocking errors
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Session errors (blocking)
//! - 2xxx: Permission errors
//! - 3xxx: Subscription errors
//! - 4xxx: Mutation errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::SubscriptionFailed, "orders feed failed")
//!     .with_detail("collection", "orders");
//! assert!(!err.is_blocking());
//! ```

mod category;
mod codes;
mod notice;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use notice::ErrorNotice;
pub use types::{AppError, AppResult};
