//! Session lifecycle
//!
//! [`Session::start`] establishes an identity, opens the four collection
//! subscriptions, and starts the coordinator, the shipping worker and an
//! auth-state watcher.
//! All of them share one cancellation token: shutdown, drop of the
//! handle, or the user changing releases every listener together.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::message::StoreEvent;
use shared::models::{Collection, DashboardStats, Scope};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::config::Config;
use super::coordinator::{Coordinator, CoordinatorOutputs, feed_closed};
use super::error::{Result, SessionError};
use super::shipping_worker::ShippingWorker;
use super::state::ViewState;
use super::tasks::{BackgroundTasks, TaskKind};
use crate::backend::{
    Backend, BackendError, RecordService, Subscription, UserId,
};
use crate::gateway::MutationGateway;
use crate::metrics::MetricsEngine;
use crate::shipping::{ShippingPolicy, ShippingSynthesizer};
use crate::store::EntityStore;

pub struct Session;

impl Session {
    /// Establish identity and start the live pipeline
    ///
    /// Fails only when no identity can be obtained. A collection whose
    /// subscription cannot be opened is reported through the pipeline and
    /// does not stop the others.
    pub async fn start<B: Backend + 'static>(config: &Config, backend: Arc<B>) -> Result<SessionHandle> {
        let user_id = establish_identity(backend.as_ref()).await?;
        tracing::info!(user_id = %user_id, "Session established");

        let store = Arc::new(EntityStore::new());
        let metrics = Arc::new(MetricsEngine::new());
        let service: Arc<dyn RecordService> = backend.clone();

        let (events_tx, events_rx) = mpsc::channel(config.event_channel_capacity);
        let (stats_tx, stats_rx) = watch::channel(Arc::new(DashboardStats::default()));
        let (state_tx, state_rx) = watch::channel(ViewState::Loading);
        let (notice_tx, notice_rx) = watch::channel(None);
        let notice_tx = Arc::new(notice_tx);

        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();

        let (shipping, shipping_worker) = ShippingWorker::new(
            user_id.clone(),
            ShippingSynthesizer::new(service.clone(), ShippingPolicy::from_config(config)),
            notice_tx.clone(),
        );
        tasks.spawn("shipping_worker", TaskKind::Worker, shipping_worker.run(shutdown.clone()));

        let coordinator = Coordinator::new(
            user_id.clone(),
            store.clone(),
            metrics.clone(),
            shipping,
            CoordinatorOutputs {
                stats: stats_tx,
                state: state_tx,
                notice: notice_tx,
            },
        );
        tasks.spawn("coordinator", TaskKind::Worker, coordinator.run(events_rx, shutdown.clone()));

        // Queued ahead of any snapshot so the view turns Ready first
        let _ = events_tx
            .send(StoreEvent::SessionEstablished {
                user_id: user_id.clone(),
            })
            .await;

        for collection in Collection::ALL {
            let scope = Scope::new(user_id.clone(), collection);
            match backend.subscribe(&scope).await {
                Ok(subscription) => {
                    let listener = listen(
                        collection,
                        subscription,
                        store.clone(),
                        events_tx.clone(),
                        shutdown.clone(),
                    );
                    tasks.spawn(format!("{collection}_listener"), TaskKind::Listener, listener);
                }
                Err(e) => {
                    report_failure(&store, &events_tx, &shutdown, collection, e).await;
                }
            }
        }

        let auth = backend.watch_user();
        tasks.spawn(
            "auth_watcher",
            TaskKind::Listener,
            watch_auth(user_id.clone(), auth, events_tx.clone(), shutdown.clone()),
        );
        tasks.log_summary();

        let gateway = MutationGateway::new(service, store.clone(), user_id.clone());
        Ok(SessionHandle {
            user_id,
            store,
            metrics,
            gateway,
            stats_rx,
            state_rx,
            notice_rx,
            events_tx,
            tasks: Some(tasks),
            shutdown,
        })
    }
}

async fn establish_identity<B: Backend>(backend: &B) -> Result<UserId> {
    if let Some(user_id) = backend.current_user().await {
        return Ok(user_id);
    }
    tracing::info!("No signed-in user, falling back to anonymous sign-in");
    backend.sign_in_anonymously().await.map_err(|e| {
        tracing::error!(code = %e.service_code(), error = %e, "Session establishment failed");
        SessionError::SignIn(e)
    })
}

async fn report_failure(
    store: &EntityStore,
    events: &mpsc::Sender<StoreEvent>,
    shutdown: &CancellationToken,
    collection: Collection,
    err: BackendError,
) {
    let error = err.into_app_error(ErrorCode::SubscriptionFailed);
    report_app_failure(store, events, shutdown, collection, error).await;
}

async fn report_app_failure(
    store: &EntityStore,
    events: &mpsc::Sender<StoreEvent>,
    shutdown: &CancellationToken,
    collection: Collection,
    error: AppError,
) {
    tracing::error!(collection = %collection, error = %error, "Collection subscription failed");
    store.record_error(collection, error.clone());
    let _ = forward(events, shutdown, StoreEvent::SubscriptionFailed { collection, error }).await;
}

/// Send an event unless shutdown fires first; `false` when it was not delivered
async fn forward(
    events: &mpsc::Sender<StoreEvent>,
    shutdown: &CancellationToken,
    event: StoreEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

/// One collection feed: replace the snapshot, then tell the coordinator
async fn listen(
    collection: Collection,
    mut subscription: Subscription,
    store: Arc<EntityStore>,
    events: mpsc::Sender<StoreEvent>,
    shutdown: CancellationToken,
) {
    loop {
        let notification = tokio::select! {
            _ = shutdown.cancelled() => break,
            notification = subscription.next() => notification,
        };

        match notification {
            Some(Ok(docs)) => {
                let version = store.replace(collection, &docs);
                let event = StoreEvent::CollectionUpdated {
                    collection,
                    version,
                    len: docs.len(),
                };
                if !forward(&events, &shutdown, event).await {
                    break;
                }
            }
            Some(Err(e)) => {
                // The service closes a feed after reporting an error on it
                subscription.cancel();
                report_failure(&store, &events, &shutdown, collection, e).await;
                shutdown.cancelled().await;
                break;
            }
            None => {
                if !shutdown.is_cancelled() {
                    report_app_failure(&store, &events, &shutdown, collection, feed_closed(collection))
                        .await;
                    shutdown.cancelled().await;
                }
                break;
            }
        }
    }
    subscription.cancel();
    tracing::debug!(collection = %collection, "Collection listener released");
}

/// Tear the session down when the signed-in user changes or signs out
async fn watch_auth(
    user_id: UserId,
    mut auth: watch::Receiver<Option<UserId>>,
    events: mpsc::Sender<StoreEvent>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = auth.changed() => {
                if changed.is_err() {
                    tracing::warn!("Auth state feed closed");
                    shutdown.cancelled().await;
                    break;
                }
                let current = auth.borrow_and_update().clone();
                if current.as_deref() != Some(user_id.as_str()) {
                    tracing::info!(user_id = %user_id, next = ?current, "Signed-in user changed, ending session");
                    shutdown.cancel();
                    let _ = events.try_send(StoreEvent::SessionEnded);
                    break;
                }
            }
        }
    }
}

/// Live session
///
/// Dropping the handle cancels every task; [`SessionHandle::shutdown`]
/// also waits for them to finish.
pub struct SessionHandle {
    user_id: UserId,
    store: Arc<EntityStore>,
    metrics: Arc<MetricsEngine>,
    gateway: MutationGateway,
    stats_rx: watch::Receiver<Arc<DashboardStats>>,
    state_rx: watch::Receiver<ViewState>,
    notice_rx: watch::Receiver<Option<AppError>>,
    events_tx: mpsc::Sender<StoreEvent>,
    tasks: Option<BackgroundTasks>,
    shutdown: CancellationToken,
}

impl SessionHandle {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn metrics(&self) -> &MetricsEngine {
        &self.metrics
    }

    /// Mutation gateway; unavailable once the session ended
    pub fn gateway(&self) -> Result<&MutationGateway> {
        if self.is_ended() {
            return Err(SessionError::Ended);
        }
        Ok(&self.gateway)
    }

    /// Latest published dashboard statistics
    pub fn stats(&self) -> Arc<DashboardStats> {
        self.stats_rx.borrow().clone()
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<Arc<DashboardStats>> {
        self.stats_rx.clone()
    }

    pub fn view_state(&self) -> ViewState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe_view_state(&self) -> watch::Receiver<ViewState> {
        self.state_rx.clone()
    }

    /// Latest non-fatal error
    pub fn last_notice(&self) -> Option<AppError> {
        self.notice_rx.borrow().clone()
    }

    pub fn subscribe_notices(&self) -> watch::Receiver<Option<AppError>> {
        self.notice_rx.clone()
    }

    pub fn is_ended(&self) -> bool {
        self.shutdown.is_cancelled() || self.state_rx.borrow().is_terminal()
    }

    /// End the session and wait until every listener is released
    pub async fn shutdown(mut self) {
        tracing::info!(user_id = %self.user_id, "Shutting down session");
        let _ = self.events_tx.try_send(StoreEvent::SessionEnded);
        if let Some(tasks) = self.tasks.take() {
            tasks.shutdown().await;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("user_id", &self.user_id)
            .field("state", &*self.state_rx.borrow())
            .finish()
    }
}
