//! LeatherCraft HQ engine - back-office dashboard core
//!
//! # Architecture
//!
//! The engine is a thin reactive view-model over a managed document/auth
//! service. It owns no durable data.
//!
//! - **Backend** (`backend`): service contract traits plus an in-process implementation
//! - **Store** (`store`): latest snapshot of orders, products, inventory and expenses
//! - **Metrics** (`metrics`): revenue / expenses / profit / stock alerts, memoized
//! - **Shipping** (`shipping`): synthetic shipping expense kept in step with orders
//! - **Gateway** (`gateway`): validated create / update / delete per collection
//! - **Core** (`core`): config, session lifecycle, coordinator, background tasks
//!
//! # Layout
//!
//! ```text
//! hq-engine/src/
//! ├── backend/       # service traits, MemoryBackend
//! ├── store/         # EntityStore
//! ├── metrics/       # DashboardStats computation
//! ├── shipping/      # auto-shipping rule
//! ├── gateway/       # mutations, validation, forms
//! ├── core/          # config, session, coordinator, tasks
//! └── utils/         # logging, money
//! ```

pub mod backend;
pub mod core;
pub mod gateway;
pub mod metrics;
pub mod shipping;
pub mod store;
pub mod utils;

pub use backend::{Backend, BackendError, MemoryBackend};
pub use core::{Config, Session, SessionError, SessionHandle, ViewState};
pub use gateway::{GatewayError, MutationGateway, OrderDraft};
pub use metrics::{MetricsEngine, compute};
pub use shipping::{ShippingPolicy, ShippingSynthesizer};
pub use store::EntityStore;
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and start logging as configured
///
/// Returns the loaded configuration.
pub fn setup_environment() -> Config {
    let _ = dotenv::dotenv();
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}

pub fn print_banner() {
    println!(
        r#"
    __               __  __               ______           ______
   / /   ___  ____ _/ /_/ /_  ___  _____/ ____/________ _/ __/ /_
  / /   / _ \/ __ `/ __/ __ \/ _ \/ ___/ /   / ___/ __ `/ /_/ __/
 / /___/  __/ /_/ / /_/ / / /  __/ /  / /___/ /  / /_/ / __/ /_
/_____/\___/\__,_/\__/_/ /_/\___/_/   \____/_/   \__,_/_/  \__/
                                                           HQ
    "#
    );
}
