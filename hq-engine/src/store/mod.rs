//! Entity Store
//!
//! Mirrors the latest snapshot of each of the four collections. A
//! snapshot is replaced wholesale on every notification; there is no
//! incremental patching and nothing is persisted. Each collection has
//! exactly one writer (its subscription task) and any number of readers.
//!
//! Every replacement bumps the collection's version, which is what the
//! metrics engine memoizes on.

use std::sync::Arc;

use parking_lot::RwLock;
use shared::error::AppError;
use shared::models::{
    Collection, Document, Expense, InventoryItem, Order, Product, Record,
};

/// One collection's current contents, shared cheaply with readers
#[derive(Debug)]
pub struct Snapshot<T> {
    pub version: u64,
    pub records: Arc<Vec<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            records: Arc::clone(&self.records),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }
}

impl<T: Record> Snapshot<T> {
    pub fn find(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }
}

struct Slot<T> {
    version: u64,
    records: Arc<Vec<T>>,
    error: Option<AppError>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            version: 0,
            records: Arc::new(Vec::new()),
            error: None,
        }
    }
}

impl<T: Record> Slot<T> {
    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            version: self.version,
            records: Arc::clone(&self.records),
        }
    }

    fn replace(&mut self, docs: &[Document]) -> u64 {
        let records = docs
            .iter()
            .filter_map(|doc| match doc.decode::<T>() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection = %T::COLLECTION,
                        id = %doc.id,
                        error = %e,
                        "Skipping undecodable record"
                    );
                    None
                }
            })
            .collect();
        self.records = Arc::new(records);
        self.version += 1;
        self.error = None;
        self.version
    }

    fn clear(&mut self) {
        self.records = Arc::new(Vec::new());
        self.version += 1;
        self.error = None;
    }
}

/// Latest known snapshot of every collection
#[derive(Default)]
pub struct EntityStore {
    orders: RwLock<Slot<Order>>,
    products: RwLock<Slot<Product>>,
    inventory: RwLock<Slot<InventoryItem>>,
    expenses: RwLock<Slot<Expense>>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("orders", &self.orders.read().records.len())
            .field("products", &self.products.read().records.len())
            .field("inventory", &self.inventory.read().records.len())
            .field("expenses", &self.expenses.read().records.len())
            .finish()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> Snapshot<Order> {
        self.orders.read().snapshot()
    }

    pub fn products(&self) -> Snapshot<Product> {
        self.products.read().snapshot()
    }

    pub fn inventory(&self) -> Snapshot<InventoryItem> {
        self.inventory.read().snapshot()
    }

    pub fn expenses(&self) -> Snapshot<Expense> {
        self.expenses.read().snapshot()
    }

    /// Replace a collection with the full contents of one notification
    ///
    /// Returns the new version. Records that fail to decode are skipped;
    /// any previously recorded error for the collection is cleared.
    pub fn replace(&self, collection: Collection, docs: &[Document]) -> u64 {
        match collection {
            Collection::Orders => self.orders.write().replace(docs),
            Collection::Products => self.products.write().replace(docs),
            Collection::Inventory => self.inventory.write().replace(docs),
            Collection::Expenses => self.expenses.write().replace(docs),
        }
    }

    /// Mark a collection's subscription as failed; its last snapshot stays
    pub fn record_error(&self, collection: Collection, error: AppError) {
        match collection {
            Collection::Orders => self.orders.write().error = Some(error),
            Collection::Products => self.products.write().error = Some(error),
            Collection::Inventory => self.inventory.write().error = Some(error),
            Collection::Expenses => self.expenses.write().error = Some(error),
        }
    }

    pub fn error(&self, collection: Collection) -> Option<AppError> {
        match collection {
            Collection::Orders => self.orders.read().error.clone(),
            Collection::Products => self.products.read().error.clone(),
            Collection::Inventory => self.inventory.read().error.clone(),
            Collection::Expenses => self.expenses.read().error.clone(),
        }
    }

    pub fn version(&self, collection: Collection) -> u64 {
        match collection {
            Collection::Orders => self.orders.read().version,
            Collection::Products => self.products.read().version,
            Collection::Inventory => self.inventory.read().version,
            Collection::Expenses => self.expenses.read().version,
        }
    }

    /// Whether every collection has received at least one notification
    pub fn is_loaded(&self) -> bool {
        Collection::ALL.iter().all(|c| self.version(*c) > 0)
    }

    pub fn find_product(&self, id: &str) -> Option<Product> {
        self.products.read().records.iter().find(|p| p.id == id).cloned()
    }

    pub fn find_expense(&self, id: &str) -> Option<Expense> {
        self.expenses.read().records.iter().find(|e| e.id == id).cloned()
    }

    /// Drop every snapshot (session ended)
    pub fn clear(&self) {
        self.orders.write().clear();
        self.products.write().clear();
        self.inventory.write().clear();
        self.expenses.write().clear();
    }
}
