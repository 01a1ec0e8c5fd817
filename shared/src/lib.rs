//! Shared types for LeatherCraft HQ
//!
//! Domain models exchanged with the backing document service, the unified
//! error type, the store pipeline events and small utilities.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use message::{EventType, StoreEvent};
