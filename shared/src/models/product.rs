//! Product Model

use super::collection::{Collection, Record};
use crate::util::lenient;
use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
}

impl Product {
    /// Name used on order lines, e.g. "Wallet - Brown"
    pub fn line_name(&self) -> String {
        format!("{} - {}", self.name, self.color)
    }
}

/// Create product payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub color: String,
    pub price: f64,
}

/// Update product payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Record for Product {
    const COLLECTION: Collection = Collection::Products;
    type Create = ProductCreate;
    type Update = ProductUpdate;

    fn id(&self) -> &str {
        &self.id
    }
}
