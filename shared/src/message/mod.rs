//! Store pipeline events
//!
//! Each live collection notification, subscription failure and session
//! transition is emitted as a typed [`StoreEvent`]. The engine's
//! coordinator consumes them in order and decides what to recompute.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;
use crate::models::Collection;

/// Event type discriminant, used for logging and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    SessionEstablished,
    CollectionUpdated,
    SubscriptionFailed,
    SessionEnded,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::SessionEstablished => write!(f, "session_established"),
            EventType::CollectionUpdated => write!(f, "collection_updated"),
            EventType::SubscriptionFailed => write!(f, "subscription_failed"),
            EventType::SessionEnded => write!(f, "session_ended"),
        }
    }
}

/// Typed notification flowing from the subscriptions to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// Identity is known; subscriptions are being opened
    SessionEstablished { user_id: String },
    /// A collection snapshot was replaced wholesale
    CollectionUpdated {
        collection: Collection,
        /// Per-collection snapshot version after the replacement
        version: u64,
        len: usize,
    },
    /// A collection's subscription reported an error; other collections keep running
    SubscriptionFailed {
        collection: Collection,
        error: AppError,
    },
    /// Logout or teardown
    SessionEnded,
}

impl StoreEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            StoreEvent::SessionEstablished { .. } => EventType::SessionEstablished,
            StoreEvent::CollectionUpdated { .. } => EventType::CollectionUpdated,
            StoreEvent::SubscriptionFailed { .. } => EventType::SubscriptionFailed,
            StoreEvent::SessionEnded => EventType::SessionEnded,
        }
    }

    pub fn collection(&self) -> Option<Collection> {
        match self {
            StoreEvent::CollectionUpdated { collection, .. }
            | StoreEvent::SubscriptionFailed { collection, .. } => Some(*collection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = StoreEvent::CollectionUpdated {
            collection: Collection::Orders,
            version: 3,
            len: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "collection_updated");
        assert_eq!(json["collection"], "orders");
        assert_eq!(event.event_type().to_string(), "collection_updated");
    }

    #[test]
    fn test_collection_accessor() {
        let failed = StoreEvent::SubscriptionFailed {
            collection: Collection::Expenses,
            error: AppError::new(ErrorCode::SubscriptionFailed),
        };
        assert_eq!(failed.collection(), Some(Collection::Expenses));
        assert_eq!(StoreEvent::SessionEnded.collection(), None);
    }
}
