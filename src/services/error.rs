//! Service error types

use thiserror::Error;

/// Service error with classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unavailable, message)
    }

    pub fn rate_not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::RateNotFound, message)
    }

    pub fn image_not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::ImageNotFound, message)
    }

    pub fn chat_not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::ChatNotFound, message)
    }

    /// Upstream was unreachable or misbehaved, as opposed to a meaningful refusal
    pub fn is_soft(&self) -> bool {
        self.kind == ServiceErrorKind::Unavailable
    }
}

/// Error classification for user-facing replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Network issues, timeouts, non-success status
    Unavailable,
    /// Converter has no rate for the pair
    RateNotFound,
    /// Image page had no recognisable image URL
    ImageNotFound,
    /// Poll target chat missing or bot not a member
    ChatNotFound,
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::unavailable(format!("Request timeout: {e}"))
        } else if e.is_connect() {
            ServiceError::unavailable(format!("Connection failed: {e}"))
        } else {
            ServiceError::unavailable(format!("Request failed: {e}"))
        }
    }
}
