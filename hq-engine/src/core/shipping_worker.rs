//! Shipping worker - runs the shipping rule off the event loop
//!
//! The coordinator submits every orders snapshot to a [`ShippingQueue`].
//! The queue keeps only the newest snapshot, so while an upsert is in
//! flight later submissions collapse into one follow-up write. A stalled
//! write therefore never delays metrics, and shutdown abandons it.

use std::sync::Arc;

use shared::error::AppError;
use shared::models::Order;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::shipping::{ShippingError, ShippingSynthesizer, SyncOutcome};
use crate::store::Snapshot;

/// Latest-wins handoff from the coordinator to the [`ShippingWorker`]
pub struct ShippingQueue {
    tx: watch::Sender<Option<Snapshot<Order>>>,
}

impl ShippingQueue {
    /// Replace any snapshot still waiting to be synced
    pub fn submit(&self, orders: Snapshot<Order>) {
        tracing::trace!(version = orders.version, "Orders snapshot queued for shipping sync");
        self.tx.send_replace(Some(orders));
    }
}

pub struct ShippingWorker {
    user_id: String,
    synthesizer: ShippingSynthesizer,
    orders: watch::Receiver<Option<Snapshot<Order>>>,
    notice: Arc<watch::Sender<Option<AppError>>>,
}

impl ShippingWorker {
    pub fn new(
        user_id: impl Into<String>,
        synthesizer: ShippingSynthesizer,
        notice: Arc<watch::Sender<Option<AppError>>>,
    ) -> (ShippingQueue, Self) {
        let (tx, orders) = watch::channel(None);
        let worker = Self {
            user_id: user_id.into(),
            synthesizer,
            orders,
            notice,
        };
        (ShippingQueue { tx }, worker)
    }

    /// Sync queued snapshots until `shutdown` fires
    pub async fn run(mut self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                changed = self.orders.changed() => {
                    if changed.is_err() {
                        // Coordinator gone; the session is ending
                        shutdown.cancelled().await;
                        break;
                    }
                }
            }

            let Some(orders) = self.orders.borrow_and_update().clone() else {
                continue;
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!(version = orders.version, "Shipping sync abandoned at shutdown");
                    break;
                }
                outcome = self.synthesizer.sync(Some(&self.user_id), &orders.records) => {
                    self.report(orders.version, outcome);
                }
            }
        }
        tracing::debug!(user_id = %self.user_id, "Shipping worker stopped");
    }

    fn report(&self, version: u64, outcome: Result<SyncOutcome, ShippingError>) {
        match outcome {
            Ok(SyncOutcome::Written { amount }) => {
                tracing::debug!(version, amount, "Shipping expense synced");
            }
            Ok(SyncOutcome::Skipped(reason)) => {
                tracing::debug!(version, reason = ?reason, "Shipping expense not synced");
            }
            Err(e) => {
                tracing::error!(version, error = %e, "Shipping expense sync failed; metrics unaffected");
                let error: AppError = e.into();
                self.notice.send_replace(Some(error));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, MemoryBackend, WriteOp};
    use crate::shipping::ShippingPolicy;
    use crate::store::EntityStore;
    use serde_json::json;
    use shared::error::ErrorCode;
    use shared::models::{AUTO_SHIPPING_ID, Collection, Document, Scope};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    struct Harness {
        backend: Arc<MemoryBackend>,
        store: EntityStore,
        queue: ShippingQueue,
        notice: watch::Receiver<Option<AppError>>,
        shutdown: CancellationToken,
        worker: JoinHandle<()>,
    }

    fn harness() -> Harness {
        let backend = Arc::new(MemoryBackend::with_user("u1"));
        let (notice_tx, notice) = watch::channel(None);
        let (queue, worker) = ShippingWorker::new(
            "u1",
            ShippingSynthesizer::new(backend.clone(), ShippingPolicy::default()),
            Arc::new(notice_tx),
        );
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(worker.run(shutdown.clone()));
        Harness {
            backend,
            store: EntityStore::new(),
            queue,
            notice,
            shutdown,
            worker,
        }
    }

    fn orders(cities: &[&str]) -> Vec<Document> {
        cities
            .iter()
            .enumerate()
            .map(|(i, city)| {
                Document::new(
                    format!("o{i}"),
                    json!({"city": city, "total": 100}).as_object().unwrap().clone(),
                )
            })
            .collect()
    }

    fn shipping_amount(backend: &MemoryBackend) -> Option<serde_json::Value> {
        backend
            .document(&Scope::new("u1", Collection::Expenses), AUTO_SHIPPING_ID)
            .map(|doc| doc.data["amount"].clone())
    }

    async fn until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_submitted_snapshot_is_written() {
        let h = harness();
        h.store.replace(Collection::Orders, &orders(&["Casablanca", "Rabat"]));
        h.queue.submit(h.store.orders());

        until(|| shipping_amount(&h.backend).is_some()).await;
        assert_eq!(shipping_amount(&h.backend), Some(json!(50.0)));
    }

    #[tokio::test]
    async fn test_snapshots_queued_during_a_stalled_write_collapse_to_the_latest() {
        let h = harness();
        h.backend.hold_writes(WriteOp::Upsert);

        h.store.replace(Collection::Orders, &orders(&["Rabat"]));
        h.queue.submit(h.store.orders());
        until(|| h.backend.held_writes() == 1).await;

        for cities in [&["Rabat", "Fes"][..], &["Rabat", "Fes", "Casablanca"][..]] {
            h.store.replace(Collection::Orders, &orders(cities));
            h.queue.submit(h.store.orders());
        }

        h.backend.release_writes(WriteOp::Upsert);
        until(|| shipping_amount(&h.backend) == Some(json!(80.0))).await;
        assert_eq!(h.backend.write_count(Collection::Expenses, WriteOp::Upsert), 2);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_stalled_write() {
        let h = harness();
        h.backend.hold_writes(WriteOp::Upsert);
        h.store.replace(Collection::Orders, &orders(&["Rabat"]));
        h.queue.submit(h.store.orders());
        until(|| h.backend.held_writes() == 1).await;

        h.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), h.worker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(h.backend.held_writes(), 0);
        assert!(shipping_amount(&h.backend).is_none());
    }

    #[tokio::test]
    async fn test_failure_is_published_as_notice() {
        let mut h = harness();
        h.backend
            .fail_next(WriteOp::Upsert, BackendError::Unavailable("offline".to_string()));
        h.store.replace(Collection::Orders, &orders(&["Rabat"]));
        h.queue.submit(h.store.orders());

        tokio::time::timeout(Duration::from_secs(2), h.notice.changed())
            .await
            .unwrap()
            .unwrap();
        let notice = h.notice.borrow().clone().unwrap();
        assert_eq!(notice.code, ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_empty_snapshot_writes_nothing() {
        let h = harness();
        h.store.replace(Collection::Orders, &[]);
        h.queue.submit(h.store.orders());
        h.store.replace(Collection::Orders, &orders(&["Fes"]));
        h.queue.submit(h.store.orders());

        until(|| shipping_amount(&h.backend).is_some()).await;
        assert_eq!(shipping_amount(&h.backend), Some(json!(30.0)));
    }
}
