//! Data models
//!
//! Shared between the engine and the presentation layer. Records are
//! decoded from service documents with lenient numeric handling; payload
//! types (`*Create`, `*Update`) are what the mutation gateway writes.

pub mod collection;
pub mod dashboard;
pub mod expense;
pub mod inventory;
pub mod order;
pub mod product;

// Re-exports
pub use collection::*;
pub use dashboard::*;
pub use expense::*;
pub use inventory::*;
pub use order::*;
pub use product::*;
