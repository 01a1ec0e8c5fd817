//! Mutation Gateway
//!
//! Typed add / update / delete per collection for the signed-in user.
//! Nothing is applied locally: the store only changes when the matching
//! live notification arrives. Failures are logged and returned to the
//! caller.
//!
//! Reserved records (see [`ReservedRecords`]) and any expense the current
//! snapshot marks `isAuto` are rejected before the service is called.

pub mod error;
pub mod forms;
pub mod policy;
pub mod validation;

use std::marker::PhantomData;
use std::sync::Arc;

use shared::models::{
    Collection, Expense, InventoryItem, Order, OrderStatus, OrderUpdate, Product, Record, Scope,
    to_fields,
};

use crate::backend::RecordService;
use crate::store::EntityStore;

pub use error::GatewayError;
pub use forms::{ExpenseFilter, OrderDraft, OrderLineDraft};
pub use policy::ReservedRecords;
pub use validation::Validate;

pub struct MutationGateway {
    service: Arc<dyn RecordService>,
    store: Arc<EntityStore>,
    user_id: String,
    reserved: ReservedRecords,
}

impl MutationGateway {
    pub fn new(service: Arc<dyn RecordService>, store: Arc<EntityStore>, user_id: impl Into<String>) -> Self {
        Self {
            service,
            store,
            user_id: user_id.into(),
            reserved: ReservedRecords::default(),
        }
    }

    pub fn with_reserved(mut self, reserved: ReservedRecords) -> Self {
        self.reserved = reserved;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn collection<T: Record>(&self) -> CollectionGateway<'_, T> {
        CollectionGateway {
            gateway: self,
            _record: PhantomData,
        }
    }

    pub fn orders(&self) -> CollectionGateway<'_, Order> {
        self.collection()
    }

    pub fn products(&self) -> CollectionGateway<'_, Product> {
        self.collection()
    }

    pub fn inventory(&self) -> CollectionGateway<'_, InventoryItem> {
        self.collection()
    }

    pub fn expenses(&self) -> CollectionGateway<'_, Expense> {
        self.collection()
    }

    /// Create an order from a form draft, priced from the product snapshot
    pub async fn place_order(&self, draft: OrderDraft) -> Result<String, GatewayError> {
        let products = self.store.products();
        let create = draft.into_create(&products.records)?;
        self.orders().add(&create).await
    }

    /// Replace an order's customer, city and lines; date and status are kept
    pub async fn edit_order(&self, id: &str, draft: OrderDraft) -> Result<(), GatewayError> {
        let products = self.store.products();
        let update = draft.into_update(&products.records)?;
        self.orders().update(id, &update).await
    }

    /// Move an order to any status; transitions are not ordered
    pub async fn set_order_status(&self, id: &str, status: OrderStatus) -> Result<(), GatewayError> {
        self.orders().update(id, &OrderUpdate::status(status)).await
    }

    fn scope(&self, collection: Collection) -> Scope {
        Scope::new(self.user_id.clone(), collection)
    }

    /// Reject writes to engine-owned records
    fn guard(&self, collection: Collection, id: &str) -> Result<(), GatewayError> {
        let reserved = self.reserved.is_reserved(collection, id)
            || (collection == Collection::Expenses
                && self.store.find_expense(id).is_some_and(|e| e.is_auto));
        if reserved {
            tracing::warn!(collection = %collection, id = %id, "Rejected write to system-managed record");
            return Err(GatewayError::Reserved {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

/// Mutations on one collection
pub struct CollectionGateway<'a, T> {
    gateway: &'a MutationGateway,
    _record: PhantomData<fn() -> T>,
}

impl<T> CollectionGateway<'_, T>
where
    T: Record,
    T::Create: Validate,
    T::Update: Validate,
{
    /// Create a record; returns the service-assigned id
    pub async fn add(&self, record: &T::Create) -> Result<String, GatewayError> {
        let collection = T::COLLECTION;
        record.validate()?;
        let fields = to_fields(record)?;

        let result = self
            .gateway
            .service
            .create(&self.gateway.scope(collection), fields)
            .await;
        match result {
            Ok(id) => {
                tracing::debug!(collection = %collection, id = %id, "Record created");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "Failed to create record");
                Err(e.into())
            }
        }
    }

    /// Merge fields into an existing record
    pub async fn update(&self, id: &str, patch: &T::Update) -> Result<(), GatewayError> {
        let collection = T::COLLECTION;
        self.gateway.guard(collection, id)?;
        patch.validate()?;
        let fields = to_fields(patch)?;
        if fields.is_empty() {
            return Err(GatewayError::validation("update carries no fields"));
        }

        let result = self
            .gateway
            .service
            .merge_update(&self.gateway.scope(collection), id, fields)
            .await;
        if let Err(e) = &result {
            tracing::warn!(collection = %collection, id = %id, error = %e, "Failed to update record");
        }
        Ok(result?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        let collection = T::COLLECTION;
        self.gateway.guard(collection, id)?;

        let result = self
            .gateway
            .service
            .delete(&self.gateway.scope(collection), id)
            .await;
        if let Err(e) = &result {
            tracing::warn!(collection = %collection, id = %id, error = %e, "Failed to delete record");
        }
        Ok(result?)
    }
}
