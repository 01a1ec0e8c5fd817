//! Order Model

use super::collection::{Collection, Record};
use crate::util::lenient;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Order fulfilment status
///
/// No transition order is enforced; any status may be set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Delivered,
    /// Missing or unrecognised value written by another client
    #[default]
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One order line, priced at the time the order was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// "<product name> - <color>"
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub product_name: String,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub qty: i64,
    /// Unit price
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
}

/// Order entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub city: String,
    /// ISO calendar date (YYYY-MM-DD)
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient::vec_or_empty")]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total: f64,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub status: OrderStatus,
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<OrderStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(Value::as_str) {
        Some("Pending") => OrderStatus::Pending,
        Some("Shipped") => OrderStatus::Shipped,
        Some("Delivered") => OrderStatus::Delivered,
        _ => OrderStatus::Unknown,
    })
}

impl Order {
    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Create order payload
///
/// `total` must equal the sum of `price * qty` over `items`; the mutation
/// gateway rejects payloads where it does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub customer_name: String,
    pub city: String,
    pub date: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
}

/// Update order payload (merged into the stored record)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderUpdate {
    /// Status-only change, as issued from the orders table
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Record for Order {
    const COLLECTION: Collection = Collection::Orders;
    type Create = OrderCreate;
    type Update = OrderUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
