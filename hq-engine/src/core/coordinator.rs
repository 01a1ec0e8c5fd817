//! Coordinator - the single consumer of store events
//!
//! ```text
//! orders ────┐
//! products ──┤  StoreEvent (mpsc)
//! inventory ─┼──────────────────► Coordinator ──► stats   (watch)
//! expenses ──┤                        │         ├► state   (watch)
//! auth ──────┘                        │         └► notices (watch)
//!                                     └──► ShippingQueue ──► ShippingWorker ──► upsert
//! ```
//!
//! Events are handled strictly in arrival order and handling never awaits
//! the service. Metrics are recomputed first, then the orders snapshot is
//! handed to the shipping worker, so a slow or failing upsert never holds
//! back the dashboard.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::message::StoreEvent;
use shared::models::{Collection, DashboardStats};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::shipping_worker::ShippingQueue;
use super::state::ViewState;
use crate::metrics::MetricsEngine;
use crate::store::EntityStore;

/// Output channels the coordinator publishes on
pub struct CoordinatorOutputs {
    pub stats: watch::Sender<Arc<DashboardStats>>,
    pub state: watch::Sender<ViewState>,
    /// Latest non-fatal error (subscription or synthesizer failure),
    /// shared with the shipping worker
    pub notice: Arc<watch::Sender<Option<AppError>>>,
}

pub struct Coordinator {
    user_id: String,
    store: Arc<EntityStore>,
    metrics: Arc<MetricsEngine>,
    shipping: ShippingQueue,
    outputs: CoordinatorOutputs,
}

impl Coordinator {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<EntityStore>,
        metrics: Arc<MetricsEngine>,
        shipping: ShippingQueue,
        outputs: CoordinatorOutputs,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            store,
            metrics,
            shipping,
            outputs,
        }
    }

    /// Consume events until the session ends or `shutdown` fires
    pub async fn run(self, mut events: mpsc::Receiver<StoreEvent>, shutdown: CancellationToken) {
        tracing::info!(user_id = %self.user_id, "Coordinator started");

        loop {
            tokio::select! {
                biased;
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("Event channel closed, coordinator stopping");
                        break;
                    };
                    if !self.handle(event) {
                        break;
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, coordinator stopping");
                    break;
                }
            }
        }

        self.end();
    }

    /// Handle one event; `false` once the session is over
    pub fn handle(&self, event: StoreEvent) -> bool {
        tracing::debug!(event = %event.event_type(), collection = ?event.collection(), "Store event");

        match event {
            StoreEvent::SessionEstablished { user_id } => {
                self.outputs.state.send_replace(ViewState::Ready { user_id });
            }
            StoreEvent::CollectionUpdated { collection, version, len } => {
                tracing::debug!(collection = %collection, version, len, "Snapshot replaced");
                self.publish_stats();
                if collection == Collection::Orders {
                    self.shipping.submit(self.store.orders());
                }
            }
            StoreEvent::SubscriptionFailed { collection, error } => {
                tracing::error!(
                    collection = %collection,
                    code = %error.code,
                    error = %error.message,
                    "Subscription failed; keeping last snapshot"
                );
                if error.is_blocking() {
                    self.outputs.state.send_replace(ViewState::Failed(error.clone()));
                }
                self.outputs.notice.send_replace(Some(error));
            }
            StoreEvent::SessionEnded => {
                tracing::info!(user_id = %self.user_id, "Session ended");
                return false;
            }
        }
        true
    }

    fn publish_stats(&self) {
        let stats = self.metrics.stats(&self.store);
        self.outputs.stats.send_if_modified(|current| {
            if Arc::ptr_eq(current, &stats) {
                false
            } else {
                *current = Arc::clone(&stats);
                true
            }
        });
    }

    fn end(&self) {
        let ended = self.outputs.state.send_if_modified(|state| {
            if matches!(state, ViewState::Ended | ViewState::Failed(_)) {
                false
            } else {
                *state = ViewState::Ended;
                true
            }
        });
        if ended {
            self.store.clear();
            self.metrics.reset();
        }
    }
}

/// Error published when a collection feed closes with no explanation
pub fn feed_closed(collection: Collection) -> AppError {
    AppError::with_message(
        ErrorCode::SubscriptionClosed,
        format!("{} feed closed by the service", collection),
    )
}
