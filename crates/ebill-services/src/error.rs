//! Error types for the service layer.

use thiserror::Error;

/// Errors that can occur when talking to an external service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A required credential was not configured.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the documented shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
