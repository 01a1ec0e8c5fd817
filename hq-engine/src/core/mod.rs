//! Core - configuration, session lifecycle and the event pipeline
//!
//! # Modules
//!
//! - [`Config`] - engine configuration
//! - [`Session`] / [`SessionHandle`] - session start and teardown
//! - [`Coordinator`] - single consumer of store events
//! - [`ShippingWorker`] - latest-wins shipping sync off the event loop
//! - [`BackgroundTasks`] - task registration and shutdown
//! - [`ViewState`] - presentation-facing session state

pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod shipping_worker;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorOutputs};
pub use error::{Result, SessionError};
pub use session::{Session, SessionHandle};
pub use shipping_worker::{ShippingQueue, ShippingWorker};
pub use state::ViewState;
pub use tasks::{BackgroundTasks, TaskKind};
