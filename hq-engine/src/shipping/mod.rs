//! Auto-Shipping Synthesizer
//!
//! Keeps the singleton synthetic shipping expense in step with the order
//! snapshot: every order costs the local rate when its city matches the
//! local city (trimmed, case-insensitive) and the default rate otherwise.
//! The total is upserted under [`AUTO_SHIPPING_ID`].
//!
//! The rule never runs before a user is established or while the order
//! snapshot is empty, so a false zero is never written.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AUTO_SHIPPING_ID, AutoShippingExpense, Collection, Order, Scope, to_fields,
};
use shared::util::today_iso;
use thiserror::Error;

use crate::backend::{BackendError, RecordService};
use crate::core::Config;
use crate::utils::money::{self, to_f64};

/// Per-order shipping tariff
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingPolicy {
    local_city: String,
    pub local_rate: f64,
    pub default_rate: f64,
}

impl ShippingPolicy {
    pub fn new(local_city: &str, local_rate: f64, default_rate: f64) -> Self {
        Self {
            local_city: normalize_city(local_city),
            local_rate,
            default_rate,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.shipping_local_city,
            config.shipping_local_rate,
            config.shipping_default_rate,
        )
    }

    pub fn local_city(&self) -> &str {
        &self.local_city
    }

    pub fn cost_for(&self, city: &str) -> f64 {
        if normalize_city(city) == self.local_city {
            self.local_rate
        } else {
            self.default_rate
        }
    }

    /// Shipping cost summed over every order
    pub fn total_for(&self, orders: &[Order]) -> f64 {
        to_f64(money::sum(orders.iter().map(|o| self.cost_for(&o.city))))
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new("casablanca", 20.0, 30.0)
    }
}

fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

/// Why a sync wrote nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoUser,
    NoOrders,
}

/// The upsert the rule settled on
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingWrite {
    pub scope: Scope,
    pub record: AutoShippingExpense,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Written { amount: f64 },
    Skipped(SkipReason),
}

#[derive(Debug, Error)]
pub enum ShippingError {
    #[error("Failed to encode shipping expense: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write shipping expense: {0}")]
    Write(#[from] BackendError),
}

impl From<ShippingError> for AppError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::Encode(e) => {
                AppError::with_message(ErrorCode::ShippingSyncFailed, e.to_string())
            }
            ShippingError::Write(e) => e.into_app_error(ErrorCode::ShippingSyncFailed),
        }
    }
}

pub struct ShippingSynthesizer {
    service: Arc<dyn RecordService>,
    policy: ShippingPolicy,
}

impl ShippingSynthesizer {
    pub fn new(service: Arc<dyn RecordService>, policy: ShippingPolicy) -> Self {
        Self { service, policy }
    }

    pub fn policy(&self) -> &ShippingPolicy {
        &self.policy
    }

    /// The record the rule would write, without writing it
    pub fn evaluate(
        &self,
        user_id: Option<&str>,
        orders: &[Order],
        date: &str,
    ) -> Result<ShippingWrite, SkipReason> {
        let Some(user_id) = user_id else {
            return Err(SkipReason::NoUser);
        };
        if orders.is_empty() {
            return Err(SkipReason::NoOrders);
        }
        Ok(ShippingWrite {
            scope: Scope::new(user_id, Collection::Expenses),
            record: AutoShippingExpense::new(self.policy.total_for(orders), date),
        })
    }

    /// Recompute and upsert the synthetic shipping expense
    pub async fn sync(
        &self,
        user_id: Option<&str>,
        orders: &[Order],
    ) -> Result<SyncOutcome, ShippingError> {
        let ShippingWrite { scope, record } = match self.evaluate(user_id, orders, &today_iso()) {
            Ok(write) => write,
            Err(reason) => {
                tracing::debug!(reason = ?reason, "Shipping sync skipped");
                return Ok(SyncOutcome::Skipped(reason));
            }
        };

        let fields = to_fields(&record)?;
        self.service.upsert(&scope, AUTO_SHIPPING_ID, fields).await?;

        tracing::info!(
            user_id = %scope.user_id,
            orders = orders.len(),
            amount = record.amount,
            "Auto shipping expense updated"
        );
        Ok(SyncOutcome::Written {
            amount: record.amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, WriteOp};
    use shared::models::{Expense, OrderStatus};

    fn order(city: &str) -> Order {
        Order {
            id: String::new(),
            customer_name: "Youssef".to_string(),
            city: city.to_string(),
            date: "2024-03-15".to_string(),
            items: vec![],
            total: 100.0,
            status: OrderStatus::Pending,
        }
    }

    fn synthesizer(backend: &Arc<MemoryBackend>) -> ShippingSynthesizer {
        ShippingSynthesizer::new(backend.clone(), ShippingPolicy::default())
    }

    #[test]
    fn test_local_city_matching() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.cost_for("Casablanca"), 20.0);
        assert_eq!(policy.cost_for(" casablanca "), 20.0);
        assert_eq!(policy.cost_for("CASABLANCA"), 20.0);
        assert_eq!(policy.cost_for("Rabat"), 30.0);
        assert_eq!(policy.cost_for(""), 30.0);
        assert_eq!(policy.cost_for("Casa"), 30.0);
    }

    #[test]
    fn test_total_for_mixed_cities() {
        let orders = vec![order("Casablanca"), order("Rabat"), order("CASABLANCA")];
        assert_eq!(ShippingPolicy::default().total_for(&orders), 70.0);
    }

    #[test]
    fn test_configured_policy() {
        let policy = ShippingPolicy::new("  Rabat ", 15.0, 40.0);
        assert_eq!(policy.local_city(), "rabat");
        assert_eq!(policy.total_for(&[order("rabat"), order("Fes")]), 55.0);
    }

    #[test]
    fn test_guards() {
        let backend = Arc::new(MemoryBackend::new());
        let synth = synthesizer(&backend);
        assert_eq!(
            synth.evaluate(None, &[order("Rabat")], "2024-03-15"),
            Err(SkipReason::NoUser)
        );
        assert_eq!(
            synth.evaluate(Some("u1"), &[], "2024-03-15"),
            Err(SkipReason::NoOrders)
        );

        let write = synth
            .evaluate(Some("u1"), &[order("Rabat")], "2024-03-15")
            .unwrap();
        assert_eq!(write.scope, Scope::new("u1", Collection::Expenses));
        assert_eq!(write.record.amount, 30.0);
    }

    #[test]
    fn test_oversized_rates_saturate() {
        let policy = ShippingPolicy::new("rabat", 5e28, 5e28);
        let orders = vec![order("Rabat"), order("Fes"), order("Rabat")];
        assert!(policy.total_for(&orders) >= 7.9e28);
    }

    #[tokio::test]
    async fn test_sync_upserts_reserved_record() {
        let backend = Arc::new(MemoryBackend::new());
        let synth = synthesizer(&backend);
        let orders = vec![order("Casablanca"), order("Rabat"), order("CASABLANCA")];

        let outcome = synth.sync(Some("u1"), &orders).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Written { amount: 70.0 });

        let scope = Scope::new("u1", Collection::Expenses);
        let expense: Expense = backend.document(&scope, AUTO_SHIPPING_ID).unwrap().decode().unwrap();
        assert_eq!(expense.amount, 70.0);
        assert!(expense.is_auto);
        assert_eq!(expense.category(), shared::models::ExpenseCategory::Shipping);
        assert_eq!(expense.date, today_iso());
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let backend = Arc::new(MemoryBackend::new());
        let synth = synthesizer(&backend);
        let orders = vec![order(" casablanca "), order("Tangier")];
        let scope = Scope::new("u1", Collection::Expenses);

        synth.sync(Some("u1"), &orders).await.unwrap();
        let first = backend.document(&scope, AUTO_SHIPPING_ID).unwrap();
        synth.sync(Some("u1"), &orders).await.unwrap();
        let second = backend.document(&scope, AUTO_SHIPPING_ID).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.data["amount"], serde_json::json!(50.0));
        assert_eq!(backend.documents(&scope).len(), 1);
    }

    #[tokio::test]
    async fn test_sync_skips_without_writing() {
        let backend = Arc::new(MemoryBackend::new());
        let synth = synthesizer(&backend);
        let outcome = synth.sync(Some("u1"), &[]).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped(SkipReason::NoOrders));
        assert_eq!(backend.write_count(Collection::Expenses, WriteOp::Upsert), 0);
    }

    #[tokio::test]
    async fn test_write_failure_maps_to_sync_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.fail_next(WriteOp::Upsert, BackendError::Internal("disk".to_string()));
        let err = synthesizer(&backend)
            .sync(Some("u1"), &[order("Rabat")])
            .await
            .unwrap_err();
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::ShippingSyncFailed);
    }
}
