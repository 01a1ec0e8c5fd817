//! Reserved-record policy
//!
//! Some records are owned by the engine itself and must never be written
//! through the ordinary mutation path. Today that is the synthetic
//! shipping expense.

use std::collections::HashSet;

use shared::models::{AUTO_SHIPPING_ID, Collection};

#[derive(Debug, Clone)]
pub struct ReservedRecords {
    ids: HashSet<(Collection, String)>,
}

impl ReservedRecords {
    /// No reserved records at all
    pub fn empty() -> Self {
        Self { ids: HashSet::new() }
    }

    pub fn reserve(mut self, collection: Collection, id: impl Into<String>) -> Self {
        self.ids.insert((collection, id.into()));
        self
    }

    pub fn is_reserved(&self, collection: Collection, id: &str) -> bool {
        self.ids.contains(&(collection, id.to_string()))
    }
}

impl Default for ReservedRecords {
    fn default() -> Self {
        Self::empty().reserve(Collection::Expenses, AUTO_SHIPPING_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reserves_auto_shipping_only_in_expenses() {
        let reserved = ReservedRecords::default();
        assert!(reserved.is_reserved(Collection::Expenses, AUTO_SHIPPING_ID));
        assert!(!reserved.is_reserved(Collection::Orders, AUTO_SHIPPING_ID));
        assert!(!reserved.is_reserved(Collection::Expenses, "e1"));
        assert!(!ReservedRecords::empty().is_reserved(Collection::Expenses, AUTO_SHIPPING_ID));
    }
}
