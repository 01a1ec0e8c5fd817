//! Collections, scopes and raw documents
//!
//! Every record lives in one of four per-user collections on the backing
//! service, addressed as `users/{uid}/{collection}`. The service hands
//! records over as [`Document`]s (identifier + field map); typed models
//! are decoded from them with [`Document::decode`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The four live collections of a data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Orders,
    Products,
    Inventory,
    Expenses,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Orders,
        Collection::Products,
        Collection::Inventory,
        Collection::Expenses,
    ];

    /// Collection name on the backing service
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Products => "products",
            Collection::Inventory => "inventory",
            Collection::Expenses => "expenses",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-scoped collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub user_id: String,
    pub collection: Collection,
}

impl Scope {
    pub fn new(user_id: impl Into<String>, collection: Collection) -> Self {
        Self {
            user_id: user_id.into(),
            collection,
        }
    }

    /// Service path, e.g. `users/abc/orders`
    pub fn path(&self) -> String {
        format!("users/{}/{}", self.user_id, self.collection)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}", self.user_id, self.collection)
    }
}

/// One record as delivered by the service: identifier plus fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Decode into a typed record, tagging it with the document id
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let mut fields = self.data.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields))
    }

    /// Shallow merge: every field of `patch` overwrites the existing field
    pub fn merge(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.data.insert(key, value);
        }
    }
}

/// Serialize a payload into a field map
///
/// Payloads must serialize as JSON objects; anything else is rejected.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "record payload must be an object, got {}",
            other
        ))),
    }
}

/// A typed record living in one collection
///
/// Ties a model to its collection and to the payload types accepted by
/// the create and merge-update paths.
pub trait Record: DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Fields accepted when creating a record
    type Create: Serialize + Send + Sync;
    /// Fields accepted when merge-updating a record
    type Update: Serialize + Send + Sync;

    fn id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_path() {
        let scope = Scope::new("u1", Collection::Inventory);
        assert_eq!(scope.path(), "users/u1/inventory");
        assert_eq!(scope.to_string(), scope.path());
    }

    #[test]
    fn test_decode_tags_id() {
        #[derive(Deserialize)]
        struct Named {
            id: String,
            name: String,
        }
        let doc = Document::new("p1", json!({"name": "Wallet"}).as_object().unwrap().clone());
        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "p1");
        assert_eq!(named.name, "Wallet");
    }

    #[test]
    fn test_merge_overwrites_fields() {
        let mut doc = Document::new(
            "e1",
            json!({"amount": 10, "category": "Tools"}).as_object().unwrap().clone(),
        );
        doc.merge(json!({"amount": 25}).as_object().unwrap().clone());
        assert_eq!(doc.data["amount"], json!(25));
        assert_eq!(doc.data["category"], json!("Tools"));
    }

    #[test]
    fn test_to_fields_rejects_scalars() {
        assert!(to_fields(&42).is_err());
        assert!(to_fields(&json!({"a": 1})).is_ok());
    }
}
