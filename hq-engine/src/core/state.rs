//! Presentation-facing session state

use shared::error::{AppError, ErrorNotice};

/// What the view should show
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Identity or first snapshots not there yet
    Loading,
    Ready { user_id: String },
    /// Blocking failure; nothing else can be shown
    Failed(AppError),
    /// Logged out or torn down
    Ended,
}

impl ViewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewState::Failed(_) | ViewState::Ended)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            ViewState::Ready { user_id } => Some(user_id),
            _ => None,
        }
    }

    /// Notice to render for a blocking failure
    pub fn notice(&self) -> Option<ErrorNotice> {
        match self {
            ViewState::Failed(err) => Some(ErrorNotice::from_app_error(err)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_failed_state_has_notice() {
        let err = AppError::with_message(ErrorCode::ApiKeyInvalid, "bad key")
            .with_detail("service_code", "auth/api-key-not-valid");
        let state = ViewState::Failed(err);
        assert!(state.is_terminal());
        assert_eq!(state.notice().unwrap().title, "Invalid API Key");
        assert!(ViewState::Loading.notice().is_none());
    }

    #[test]
    fn test_ready_exposes_user() {
        let state = ViewState::Ready {
            user_id: "u1".to_string(),
        };
        assert!(state.is_ready());
        assert_eq!(state.user_id(), Some("u1"));
    }
}
