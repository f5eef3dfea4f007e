use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    DuplicateEmail,
    PersistenceFailed,
    InvalidToken,
}

pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already on the waitlist";

/// Error body returned by every failing waitlist endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{error_code:?}: {message}")]
pub struct ApiError {
    pub error_code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
        }
    }

    pub fn duplicate_email() -> Self {
        Self::new(ErrorCode::DuplicateEmail, DUPLICATE_EMAIL_MESSAGE)
    }

    pub fn is_duplicate_email(&self) -> bool {
        self.error_code == ErrorCode::DuplicateEmail
    }
}
