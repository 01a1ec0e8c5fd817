//! External service contract
//!
//! The engine owns no persistence, authentication or transport. It talks
//! to a managed document/auth service through three traits:
//!
//! - [`AuthProvider`]: session establishment and the auth-state feed
//! - [`LiveCollections`]: full-snapshot subscriptions per scope
//! - [`RecordService`]: create / merge-update / delete / upsert
//!
//! [`MemoryBackend`] implements all three in-process.

pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::error::{AppError, ErrorCode};
use shared::models::{Document, Scope};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

pub use memory::{MemoryBackend, WriteOp};

/// Opaque, service-assigned user identifier
pub type UserId = String;

/// One notification of a live subscription: the full current contents
pub type SnapshotResult = Result<Vec<Document>, BackendError>;

/// Errors reported by the backing service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Auth provider failure carrying the provider's own code
    #[error("Auth error ({code}): {message}")]
    Auth { code: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackendError {
    /// The service's error code string
    pub fn service_code(&self) -> &str {
        match self {
            BackendError::PermissionDenied(_) => "permission-denied",
            BackendError::Unauthenticated(_) => "unauthenticated",
            BackendError::Auth { code, .. } => code,
            BackendError::NotFound(_) => "not-found",
            BackendError::InvalidArgument(_) => "invalid-argument",
            BackendError::Unavailable(_) => "unavailable",
            BackendError::Internal(_) => "internal",
        }
    }

    /// Map onto the unified error code; `fallback` is used for
    /// failures that only make sense in the caller's context
    pub fn error_code(&self, fallback: ErrorCode) -> ErrorCode {
        match self {
            BackendError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            BackendError::Unauthenticated(_) => ErrorCode::NotAuthenticated,
            BackendError::Auth { code, .. } => match code.as_str() {
                "auth/api-key-not-valid" => ErrorCode::ApiKeyInvalid,
                "auth/configuration-not-found" => ErrorCode::AuthNotConfigured,
                _ => ErrorCode::SessionFailed,
            },
            BackendError::NotFound(_) => ErrorCode::NotFound,
            BackendError::InvalidArgument(_) => ErrorCode::InvalidRequest,
            BackendError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            BackendError::Internal(_) => fallback,
        }
    }

    /// Convert into an [`AppError`], tagging the service code
    pub fn into_app_error(self, fallback: ErrorCode) -> AppError {
        let code = self.error_code(fallback);
        let service_code = self.service_code().to_string();
        AppError::with_message(code, self.to_string()).with_detail("service_code", service_code)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        err.into_app_error(ErrorCode::InternalError)
    }
}

/// Handle to a live collection subscription
///
/// Yields full-snapshot notifications in the order the service emits them.
/// Dropping the handle (or calling [`Subscription::cancel`]) releases the
/// listener on the service side.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<SnapshotResult>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next notification; `None` once the service closed the feed
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Session establishment
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Currently signed-in user, if any
    async fn current_user(&self) -> Option<UserId>;

    /// Fallback when no identity exists yet
    async fn sign_in_anonymously(&self) -> Result<UserId, BackendError>;

    /// Auth-state feed; `None` means signed out
    fn watch_user(&self) -> watch::Receiver<Option<UserId>>;
}

/// Live full-snapshot subscriptions
#[async_trait]
pub trait LiveCollections: Send + Sync {
    async fn subscribe(&self, scope: &Scope) -> Result<Subscription, BackendError>;
}

/// Record mutations
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Create a record with a service-assigned id
    async fn create(&self, scope: &Scope, data: Map<String, Value>)
    -> Result<String, BackendError>;

    /// Merge fields into an existing record; fails if it does not exist
    async fn merge_update(
        &self,
        scope: &Scope,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), BackendError>;

    async fn delete(&self, scope: &Scope, id: &str) -> Result<(), BackendError>;

    /// Create the record under `id` if absent, else merge into it
    async fn upsert(
        &self,
        scope: &Scope,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<(), BackendError>;
}

/// Everything a session needs from the service
pub trait Backend: AuthProvider + LiveCollections + RecordService {}

impl<T: AuthProvider + LiveCollections + RecordService> Backend for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_codes_map_to_session_errors() {
        let err = BackendError::Auth {
            code: "auth/configuration-not-found".to_string(),
            message: "anonymous sign-in disabled".to_string(),
        };
        let app = err.into_app_error(ErrorCode::SessionFailed);
        assert_eq!(app.code, ErrorCode::AuthNotConfigured);
        assert_eq!(app.service_code(), Some("auth/configuration-not-found"));
        assert!(app.is_blocking());
    }

    #[test]
    fn test_internal_uses_fallback() {
        let err = BackendError::Internal("boom".to_string());
        assert_eq!(
            err.error_code(ErrorCode::MutationFailed),
            ErrorCode::MutationFailed
        );
        let app: AppError = BackendError::PermissionDenied("rules".to_string()).into();
        assert_eq!(app.code, ErrorCode::PermissionDenied);
        assert_eq!(app.service_code(), Some("permission-denied"));
    }

    #[tokio::test]
    async fn test_dropping_subscription_cancels() {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let mut sub = Subscription::new(rx, token.clone());
        tx.send(Ok(vec![])).unwrap();
        assert!(matches!(sub.next().await, Some(Ok(docs)) if docs.is_empty()));
        drop(sub);
        assert!(token.is_cancelled());
    }
}
