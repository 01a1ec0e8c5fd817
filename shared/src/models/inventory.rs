//! Inventory Model

use super::collection::{Collection, Record};
use crate::util::lenient;
use serde::{Deserialize, Serialize};

/// Raw-material or finished-goods stock line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub stock: i64,
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub low_stock_threshold: i64,
}

impl InventoryItem {
    /// Low stock iff stock <= threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_low_stock() {
            "Low Stock"
        } else {
            "In Stock"
        }
    }
}

/// Create inventory item payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemCreate {
    pub name: String,
    pub stock: i64,
    pub low_stock_threshold: i64,
}

/// Update inventory item payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i64>,
}

impl Record for InventoryItem {
    const COLLECTION: Collection = Collection::Inventory;
    type Create = InventoryItemCreate;
    type Update = InventoryItemUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
