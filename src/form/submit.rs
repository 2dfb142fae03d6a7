use async_trait::async_trait;
use thiserror::Error;

use crate::schema::field_model::FormResponse;

/// Surfaced when whole-form validation blocks a submit.
pub const INVALID_FORM_MESSAGE: &str = "Please fix all validation errors before submitting";

/// Surfaced when the step gate refuses to advance.
pub const STEP_BLOCKED_MESSAGE: &str = "Please fix all validation errors before proceeding";

/// Fallback when a rejection carries no message.
pub const GENERIC_SUBMIT_ERROR: &str = "An error occurred";

/// Rejection from the injected submit handler.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Rejected(String),

    #[error("An error occurred")]
    Unspecified,
}

impl SubmitError {
    pub fn rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            SubmitError::Unspecified
        } else {
            SubmitError::Rejected(message)
        }
    }
}

/// Transport for a validated, formatted response. The only asynchronous
/// collaborator of the core.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, response: &FormResponse) -> Result<(), SubmitError>;
}

/// Notifications to the presentation layer. Both default to no-ops.
pub trait FormCallbacks {
    fn on_success(&mut self) {}
    fn on_error(&mut self, _message: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

impl FormCallbacks for NoopCallbacks {}

/// How a submit request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Validation failed; the handler was not called
    Invalid,
    /// Another submit is still pending; request ignored
    AlreadySubmitting,
    /// The handler rejected; form state kept for a retry
    Rejected(String),
    /// No submit was pending, nothing reported
    Idle,
}
