use shared::error::{AppError, ErrorCode};
use shared::models::Collection;
use thiserror::Error;

use crate::backend::BackendError;

/// Mutation gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order has no valid items")]
    EmptyOrder,

    #[error("Record {collection}/{id} is system-managed and cannot be modified")]
    Reserved { collection: Collection, id: String },

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(msg) => AppError::validation(msg),
            GatewayError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            GatewayError::Reserved { collection, id } => {
                AppError::reserved(&id).with_detail("collection", collection.as_str())
            }
            GatewayError::Encode(e) => AppError::with_message(ErrorCode::InvalidFormat, e.to_string()),
            GatewayError::Backend(e) => e.into_app_error(ErrorCode::MutationFailed),
        }
    }
}
