//! Utilities - logging and money arithmetic

pub mod logger;
pub mod money;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
