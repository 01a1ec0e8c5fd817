//! Payload validation
//!
//! Every create/update payload is checked before it reaches the service.
//! Updates only check the fields they carry.

use shared::models::{
    ExpenseCreate, ExpenseKind, ExpenseUpdate, InventoryItemCreate, InventoryItemUpdate,
    OrderCreate, OrderItem, OrderStatus, OrderUpdate, ProductCreate, ProductUpdate,
};
use rust_decimal::Decimal;
use shared::util::parse_iso_date;

use super::error::GatewayError;
use crate::utils::money::{self, approx_eq, to_f64};

// ── Limits ──────────────────────────────────────────────────────────

/// Names: customer, city, product, color, inventory item, campaign
pub const MAX_NAME_LEN: usize = 200;

/// Expense descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Maximum amount for a single price or expense
pub const MAX_AMOUNT: f64 = 1_000_000.0;

/// Maximum quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

/// A payload the gateway accepts
pub trait Validate {
    fn validate(&self) -> Result<(), GatewayError>;
}

// ── Helpers ─────────────────────────────────────────────────────────

pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), GatewayError> {
    if value.trim().is_empty() {
        return Err(GatewayError::validation(format!("{field} must not be empty")));
    }
    validate_text_len(value, field, max_len)
}

fn validate_text_len(value: &str, field: &str, max_len: usize) -> Result<(), GatewayError> {
    let len = value.chars().count();
    if len > max_len {
        return Err(GatewayError::validation(format!(
            "{field} is too long ({len} chars, max {max_len})"
        )));
    }
    Ok(())
}

pub fn validate_amount(value: f64, field: &str) -> Result<(), GatewayError> {
    if !value.is_finite() {
        return Err(GatewayError::validation(format!("{field} must be a finite number, got {value}")));
    }
    if value < 0.0 {
        return Err(GatewayError::validation(format!("{field} must be non-negative, got {value}")));
    }
    if value > MAX_AMOUNT {
        return Err(GatewayError::validation(format!(
            "{field} exceeds maximum allowed ({MAX_AMOUNT}), got {value}"
        )));
    }
    Ok(())
}

pub fn validate_count(value: i64, field: &str) -> Result<(), GatewayError> {
    if value < 0 {
        return Err(GatewayError::validation(format!("{field} must be non-negative, got {value}")));
    }
    Ok(())
}

pub fn validate_date(value: &str, field: &str) -> Result<(), GatewayError> {
    if parse_iso_date(value).is_none() {
        return Err(GatewayError::validation(format!(
            "{field} must be an ISO date (YYYY-MM-DD), got {value:?}"
        )));
    }
    Ok(())
}

pub fn validate_items(items: &[OrderItem]) -> Result<(), GatewayError> {
    if items.is_empty() {
        return Err(GatewayError::EmptyOrder);
    }
    for item in items {
        validate_required_text(&item.product_name, "product name", MAX_NAME_LEN)?;
        if item.qty <= 0 {
            return Err(GatewayError::validation(format!("qty must be positive, got {}", item.qty)));
        }
        if item.qty > MAX_QUANTITY {
            return Err(GatewayError::validation(format!(
                "qty exceeds maximum allowed ({MAX_QUANTITY}), got {}",
                item.qty
            )));
        }
        validate_amount(item.price, "price")?;
    }
    Ok(())
}

/// Order total as the sum of its lines
pub fn items_total(items: &[OrderItem]) -> f64 {
    to_f64(
        items
            .iter()
            .map(|i| money::line_total(i.price, i.qty))
            .fold(Decimal::ZERO, Decimal::saturating_add),
    )
}

fn validate_total(items: &[OrderItem], total: f64) -> Result<(), GatewayError> {
    validate_amount(total, "total")?;
    let expected = items_total(items);
    if !approx_eq(total, expected) {
        return Err(GatewayError::validation(format!(
            "total {total} does not match item lines ({expected})"
        )));
    }
    Ok(())
}

fn validate_expense_kind(kind: &ExpenseKind) -> Result<(), GatewayError> {
    if let ExpenseKind::Marketing { campaign, .. } = kind {
        validate_required_text(campaign, "campaign", MAX_NAME_LEN)?;
    }
    Ok(())
}

// ── Payloads ────────────────────────────────────────────────────────

impl Validate for OrderCreate {
    fn validate(&self) -> Result<(), GatewayError> {
        validate_required_text(&self.customer_name, "customer name", MAX_NAME_LEN)?;
        validate_required_text(&self.city, "city", MAX_NAME_LEN)?;
        validate_date(&self.date, "date")?;
        validate_items(&self.items)?;
        validate_total(&self.items, self.total)?;
        if self.status != OrderStatus::Pending {
            return Err(GatewayError::validation(format!(
                "new orders start as Pending, got {}",
                self.status
            )));
        }
        Ok(())
    }
}

impl Validate for OrderUpdate {
    fn validate(&self) -> Result<(), GatewayError> {
        if let Some(name) = &self.customer_name {
            validate_required_text(name, "customer name", MAX_NAME_LEN)?;
        }
        if let Some(city) = &self.city {
            validate_required_text(city, "city", MAX_NAME_LEN)?;
        }
        if let Some(items) = &self.items {
            validate_items(items)?;
        }
        match (&self.items, self.total) {
            (Some(items), Some(total)) => validate_total(items, total)?,
            (None, Some(total)) => validate_amount(total, "total")?,
            (Some(_), None) => {
                return Err(GatewayError::validation("items changed without a new total"));
            }
            (None, None) => {}
        }
        if self.status == Some(OrderStatus::Unknown) {
            return Err(GatewayError::validation("status must be Pending, Shipped or Delivered"));
        }
        Ok(())
    }
}

impl Validate for ProductCreate {
    fn validate(&self) -> Result<(), GatewayError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&self.color, "color", MAX_NAME_LEN)?;
        validate_amount(self.price, "price")
    }
}

impl Validate for ProductUpdate {
    fn validate(&self) -> Result<(), GatewayError> {
        if let Some(name) = &self.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        if let Some(color) = &self.color {
            validate_required_text(color, "color", MAX_NAME_LEN)?;
        }
        if let Some(price) = self.price {
            validate_amount(price, "price")?;
        }
        Ok(())
    }
}

impl Validate for InventoryItemCreate {
    fn validate(&self) -> Result<(), GatewayError> {
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_count(self.stock, "stock")?;
        validate_count(self.low_stock_threshold, "low stock threshold")
    }
}

impl Validate for InventoryItemUpdate {
    fn validate(&self) -> Result<(), GatewayError> {
        if let Some(name) = &self.name {
            validate_required_text(name, "name", MAX_NAME_LEN)?;
        }
        if let Some(stock) = self.stock {
            validate_count(stock, "stock")?;
        }
        if let Some(threshold) = self.low_stock_threshold {
            validate_count(threshold, "low stock threshold")?;
        }
        Ok(())
    }
}

impl Validate for ExpenseCreate {
    fn validate(&self) -> Result<(), GatewayError> {
        validate_date(&self.date, "date")?;
        validate_expense_kind(&self.kind)?;
        validate_required_text(&self.effective_description(), "description", MAX_NOTE_LEN)?;
        validate_amount(self.amount, "amount")
    }
}

impl Validate for ExpenseUpdate {
    fn validate(&self) -> Result<(), GatewayError> {
        if let Some(date) = &self.date {
            validate_date(date, "date")?;
        }
        if let Some(kind) = &self.kind {
            validate_expense_kind(kind)?;
        }
        if let Some(description) = &self.description {
            validate_text_len(description, "description", MAX_NOTE_LEN)?;
        }
        if let Some(amount) = self.amount {
            validate_amount(amount, "amount")?;
        }
        Ok(())
    }
}
