//! Derived Metrics Engine
//!
//! [`compute`] is a pure function of the orders, expenses and inventory
//! snapshots. [`MetricsEngine`] memoizes it on the snapshot versions so
//! repeated reads between notifications never recompute.
//!
//! Rules:
//! - revenue counts Delivered orders only
//! - expenses count every expense, the synthetic shipping record included
//! - profit may be negative
//! - low stock means `stock <= lowStockThreshold`
//! - every order date seeds its month, whatever the status
//! - records with unparseable dates count toward totals but not the chart

pub mod month;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{
    CategorySlice, DashboardStats, Expense, ExpenseCategory, InventoryItem, MonthlyProfit, Order,
};

use crate::store::EntityStore;
use crate::utils::money::{self, to_f64};

pub use month::MonthKey;

#[derive(Default)]
struct MonthTotals {
    revenue: Decimal,
    expenses: Decimal,
}

/// Dashboard statistics for one set of snapshots
pub fn compute(orders: &[Order], expenses: &[Expense], inventory: &[InventoryItem]) -> DashboardStats {
    let total_revenue = money::sum(orders.iter().filter(|o| o.is_delivered()).map(|o| o.total));
    let total_expenses = money::sum(expenses.iter().map(|e| e.amount));

    let pending_orders = orders.iter().filter(|o| o.is_pending()).count();
    let low_stock_items = inventory.iter().filter(|i| i.is_low_stock()).count();

    let mut by_category: BTreeMap<ExpenseCategory, Decimal> = BTreeMap::new();
    for expense in expenses {
        money::accumulate(by_category.entry(expense.category()).or_default(), expense.amount);
    }
    let expense_chart_data = by_category
        .into_iter()
        .map(|(category, value)| CategorySlice {
            name: category.as_str().to_string(),
            value: to_f64(value),
        })
        .collect();

    let mut by_month: BTreeMap<MonthKey, MonthTotals> = BTreeMap::new();
    for order in orders {
        let Some(key) = MonthKey::from_date(&order.date) else {
            continue;
        };
        let totals = by_month.entry(key).or_default();
        if order.is_delivered() {
            money::accumulate(&mut totals.revenue, order.total);
        }
    }
    for expense in expenses {
        let Some(key) = MonthKey::from_date(&expense.date) else {
            continue;
        };
        money::accumulate(&mut by_month.entry(key).or_default().expenses, expense.amount);
    }
    let profit_chart_data = by_month
        .into_iter()
        .map(|(key, totals)| MonthlyProfit {
            name: key.label(),
            year: key.year,
            month: key.month,
            revenue: to_f64(totals.revenue),
            expenses: to_f64(totals.expenses),
            profit: to_f64(money::difference(totals.revenue, totals.expenses)),
        })
        .collect();

    DashboardStats {
        total_revenue: to_f64(total_revenue),
        total_expenses: to_f64(total_expenses),
        net_profit: to_f64(money::difference(total_revenue, total_expenses)),
        pending_orders,
        low_stock_items,
        expense_chart_data,
        profit_chart_data,
    }
}

/// Snapshot versions the cached stats were computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InputVersions {
    orders: u64,
    expenses: u64,
    inventory: u64,
}

/// Memoizing front of [`compute`]
#[derive(Default)]
pub struct MetricsEngine {
    cached: Mutex<Option<(InputVersions, Arc<DashboardStats>)>>,
    recomputations: AtomicU64,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for the store's current snapshots
    ///
    /// Recomputes only when one of the input snapshots changed since the
    /// last call.
    pub fn stats(&self, store: &EntityStore) -> Arc<DashboardStats> {
        let orders = store.orders();
        let expenses = store.expenses();
        let inventory = store.inventory();
        let versions = InputVersions {
            orders: orders.version,
            expenses: expenses.version,
            inventory: inventory.version,
        };

        let mut cached = self.cached.lock();
        if let Some((seen, stats)) = cached.as_ref() {
            if *seen == versions {
                return Arc::clone(stats);
            }
        }

        let stats = Arc::new(compute(&orders.records, &expenses.records, &inventory.records));
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            orders = versions.orders,
            expenses = versions.expenses,
            inventory = versions.inventory,
            revenue = stats.total_revenue,
            expenses_total = stats.total_expenses,
            "Dashboard metrics recomputed"
        );
        *cached = Some((versions, Arc::clone(&stats)));
        stats
    }

    /// Number of times the stats were actually computed
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }

    /// Forget the cached stats
    pub fn reset(&self) {
        *self.cached.lock() = None;
    }
}
