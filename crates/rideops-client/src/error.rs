//! Error types for the RideOps client

use thiserror::Error;

/// Result type alias for client operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Main error type for the RideOps client
///
/// Every failure is per-call; nothing here is fatal to the process. Renewal
/// failures are handled inside the request pipeline and never reach callers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network/DNS/timeout failure from the underlying transport
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status other than the expired-session 401
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server reported the bearer token as expired; session cleared
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    /// Response body could not be parsed as JSON
    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Persistent session storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Build an HTTP error from a status code and message
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, when this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Whether the error ended the authenticated session
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_message_only() {
        let err = ApiError::http(404, "Ride not found");
        assert_eq!(err.to_string(), "Ride not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn session_expired_has_fixed_message() {
        let err = ApiError::SessionExpired;
        assert_eq!(err.to_string(), "Session expired. Please log in again.");
        assert!(err.is_session_expired());
        assert_eq!(err.status(), Some(401));
    }
}
