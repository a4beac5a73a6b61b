//! Error types for fleet-link.

use thiserror::Error;

/// Errors produced by the notification and alert delivery core.
#[derive(Error, Debug)]
pub enum FleetLinkError {
    /// Transport-level failure (DNS, TCP, TLS, connection reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The backend rejected the supplied credentials.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Invalid client configuration (missing base URL, unparsable URL).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// A request or response body could not be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The server-push stream failed or ended.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The backend answered with a non-success status.
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type for fleet-link operations.
pub type Result<T> = std::result::Result<T, FleetLinkError>;

impl FleetLinkError {
    /// Map a non-success HTTP status plus body text to an error.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string()
        } else {
            body
        };
        match status.as_u16() {
            401 | 403 => FleetLinkError::AuthenticationError(message),
            code => FleetLinkError::ServerError {
                status_code: code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for FleetLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FleetLinkError::TimeoutError(err.to_string())
        } else if err.is_decode() {
            FleetLinkError::SerializationError(err.to_string())
        } else {
            FleetLinkError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FleetLinkError {
    fn from(err: serde_json::Error) -> Self {
        FleetLinkError::SerializationError(err.to_string())
    }
}
