//! Form drafts
//!
//! Turns what a user picked in a form into gateway payloads, resolved
//! against the current product snapshot, plus the expense-list filter.

use shared::models::{
    Expense, ExpenseCategory, OrderCreate, OrderItem, OrderStatus, OrderUpdate, Product,
};
use shared::util::today_iso;

use super::error::GatewayError;
use super::validation::items_total;
use crate::utils::money;

/// One product line of an order form
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub product_id: String,
    pub qty: i64,
}

impl OrderLineDraft {
    pub fn new(product_id: impl Into<String>, qty: i64) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}

/// Order form contents
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub city: String,
    pub lines: Vec<OrderLineDraft>,
}

impl OrderDraft {
    pub fn new(customer_name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            city: city.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, product_id: impl Into<String>, qty: i64) -> Self {
        self.lines.push(OrderLineDraft::new(product_id, qty));
        self
    }

    /// Resolve lines against the product list
    ///
    /// Lines with no product selected or an unknown product are dropped.
    /// Each kept line is priced at the product's current price.
    pub fn resolve(&self, products: &[Product]) -> Result<Vec<OrderItem>, GatewayError> {
        let items: Vec<OrderItem> = self
            .lines
            .iter()
            .filter(|line| !line.product_id.trim().is_empty())
            .filter_map(|line| {
                let product = products.iter().find(|p| p.id == line.product_id)?;
                Some(OrderItem {
                    product_name: product.line_name(),
                    qty: line.qty,
                    price: product.price,
                })
            })
            .collect();

        if items.is_empty() {
            return Err(GatewayError::EmptyOrder);
        }
        Ok(items)
    }

    /// New order dated today, starting as Pending
    pub fn into_create(self, products: &[Product]) -> Result<OrderCreate, GatewayError> {
        self.into_create_on(products, today_iso())
    }

    pub fn into_create_on(
        self,
        products: &[Product],
        date: impl Into<String>,
    ) -> Result<OrderCreate, GatewayError> {
        let items = self.resolve(products)?;
        let total = items_total(&items);
        Ok(OrderCreate {
            customer_name: self.customer_name,
            city: self.city,
            date: date.into(),
            items,
            total,
            status: OrderStatus::Pending,
        })
    }

    /// Edit of an existing order; its date and status are left untouched
    pub fn into_update(self, products: &[Product]) -> Result<OrderUpdate, GatewayError> {
        let items = self.resolve(products)?;
        let total = items_total(&items);
        Ok(OrderUpdate {
            customer_name: Some(self.customer_name),
            city: Some(self.city),
            items: Some(items),
            total: Some(total),
            status: None,
        })
    }
}

/// Expense list filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseFilter {
    All,
    Category(ExpenseCategory),
}

impl ExpenseFilter {
    /// "All" first, then each category present, in order of first appearance
    pub fn options(expenses: &[Expense]) -> Vec<ExpenseFilter> {
        let mut options = vec![ExpenseFilter::All];
        for expense in expenses {
            let option = ExpenseFilter::Category(expense.category());
            if !options.contains(&option) {
                options.push(option);
            }
        }
        options
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExpenseFilter::All => "All",
            ExpenseFilter::Category(c) => c.as_str(),
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        match self {
            ExpenseFilter::All => true,
            ExpenseFilter::Category(c) => expense.category() == *c,
        }
    }

    pub fn apply<'a>(&self, expenses: &'a [Expense]) -> Vec<&'a Expense> {
        expenses.iter().filter(|e| self.matches(e)).collect()
    }

    /// Sum of the amounts the filter keeps
    pub fn total(&self, expenses: &[Expense]) -> f64 {
        money::to_f64(money::sum(
            expenses.iter().filter(|e| self.matches(e)).map(|e| e.amount),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::validation::Validate;
    use shared::models::ExpenseKind;

    fn products() -> Vec<Product> {
        vec![
            Product {
                id: "p1".to_string(),
                name: "Wallet".to_string(),
                color: "Brown".to_string(),
                price: 150.0,
            },
            Product {
                id: "p2".to_string(),
                name: "Belt".to_string(),
                color: "Black".to_string(),
                price: 120.5,
            },
        ]
    }

    fn expense(kind: ExpenseKind, amount: f64) -> Expense {
        Expense {
            id: String::new(),
            date: "2024-03-01".to_string(),
            kind,
            description: String::new(),
            amount,
            is_auto: false,
        }
    }

    #[test]
    fn test_resolve_drops_unknown_and_blank_lines() {
        let draft = OrderDraft::new("Amina", "Rabat")
            .line("p1", 2)
            .line("", 1)
            .line("missing", 3)
            .line("p2", 1);
        let items = draft.resolve(&products()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].product_name, "Wallet - Brown");
        assert_eq!(items[1].product_name, "Belt - Black");
        assert_eq!(items[1].price, 120.5);
    }

    #[test]
    fn test_nothing_resolvable_is_empty_order() {
        let draft = OrderDraft::new("Amina", "Rabat").line("missing", 1);
        assert!(matches!(draft.resolve(&products()), Err(GatewayError::EmptyOrder)));
    }

    #[test]
    fn test_create_prices_and_defaults() {
        let create = OrderDraft::new("Amina", "Rabat")
            .line("p1", 2)
            .line("p2", 1)
            .into_create_on(&products(), "2024-03-15")
            .unwrap();
        assert_eq!(create.total, 420.5);
        assert_eq!(create.status, OrderStatus::Pending);
        assert_eq!(create.date, "2024-03-15");

        let today = OrderDraft::new("Amina", "Rabat")
            .line("p1", 1)
            .into_create(&products())
            .unwrap();
        assert_eq!(today.date, today_iso());
    }

    #[test]
    fn test_oversized_prices_are_rejected_not_panicked() {
        let mut catalog = products();
        catalog[0].price = 5e28;
        let create = OrderDraft::new("Amina", "Rabat")
            .line("p1", 3)
            .line("p2", 9999)
            .into_create_on(&catalog, "2024-03-15")
            .unwrap();
        assert!(create.total >= 7.9e28);
        assert!(create.validate().is_err());
    }

    #[test]
    fn test_update_keeps_date_and_status() {
        let update = OrderDraft::new("Amina", "Fes")
            .line("p2", 2)
            .into_update(&products())
            .unwrap();
        assert_eq!(update.total, Some(241.0));
        assert!(update.status.is_none());
        let wire = serde_json::to_value(&update).unwrap();
        assert!(wire.get("date").is_none());
        assert!(wire.get("status").is_none());
    }

    #[test]
    fn test_expense_filter_options_and_total() {
        let expenses = vec![
            expense(ExpenseKind::Shipping, 70.0),
            expense(ExpenseKind::Materials, 50.0),
            expense(ExpenseKind::Materials, 30.25),
        ];
        let labels: Vec<&str> = ExpenseFilter::options(&expenses)
            .iter()
            .map(ExpenseFilter::label)
            .collect();
        assert_eq!(labels, vec!["All", "Shipping", "Materials"]);

        let materials = ExpenseFilter::Category(ExpenseCategory::Materials);
        assert_eq!(materials.apply(&expenses).len(), 2);
        assert_eq!(materials.total(&expenses), 80.25);
        assert_eq!(ExpenseFilter::All.total(&expenses), 150.25);
    }
}
