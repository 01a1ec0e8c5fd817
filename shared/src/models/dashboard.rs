//! Dashboard statistics
//!
//! Output of the derived metrics engine, consumed by the presentation
//! layer. Chart entries keep the field names the chart components bind to.

use serde::{Deserialize, Serialize};

/// Total expenses of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySlice {
    pub name: String,
    pub value: f64,
}

/// Revenue vs expenses for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProfit {
    /// Short month name and year, e.g. "Mar 2024"
    pub name: String,
    pub year: i32,
    /// 1-based month
    pub month: u32,
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
}

/// Everything the dashboard view displays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of totals of delivered orders
    pub total_revenue: f64,
    /// Sum of all expense amounts, automated shipping included
    pub total_expenses: f64,
    /// May be negative
    pub net_profit: f64,
    pub pending_orders: usize,
    pub low_stock_items: usize,
    pub expense_chart_data: Vec<CategorySlice>,
    /// Sorted ascending by month
    pub profit_chart_data: Vec<MonthlyProfit>,
}

impl DashboardStats {
    pub fn expense_for(&self, category: &str) -> Option<f64> {
        self.expense_chart_data
            .iter()
            .find(|s| s.name == category)
            .map(|s| s.value)
    }

    pub fn month(&self, year: i32, month: u32) -> Option<&MonthlyProfit> {
        self.profit_chart_data
            .iter()
            .find(|m| m.year == year && m.month == month)
    }
}
