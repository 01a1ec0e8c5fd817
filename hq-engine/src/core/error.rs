use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::backend::BackendError;

/// Session lifecycle errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// No identity could be obtained; fatal to the whole view
    #[error("Failed to establish session: {0}")]
    SignIn(#[source] BackendError),

    #[error("Session already ended")]
    Ended,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SignIn(e) => e.into_app_error(ErrorCode::SessionFailed),
            SessionError::Ended => AppError::new(ErrorCode::SessionEnded),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_failure_is_blocking() {
        let err: AppError = SessionError::SignIn(BackendError::Auth {
            code: "auth/api-key-not-valid".to_string(),
            message: "bad key".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ApiKeyInvalid);
        assert!(err.is_blocking());
    }
}
