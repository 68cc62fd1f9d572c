//! Error types for skymark.
//!
//! A single crate-wide error enum keeps error handling uniform across the
//! local database, the hosted backend, and the image archive API.

use thiserror::Error;

/// All errors surfaced by skymark.
#[derive(Debug, Error)]
pub enum SkymarkError {
    /// An operation required a signed-in session and none exists.
    ///
    /// Writes are rejected with this error immediately; they are never
    /// queued on behalf of an anonymous user.
    #[error("not signed in: {0}")]
    AuthRequired(String),

    /// Local `SQLite` database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration loading, parsing, or path resolution failure.
    #[error("config error: {0}")]
    Config(String),

    /// Transport-level failure reaching a remote service.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status code.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid user input (region syntax, operation kinds, arguments).
    #[error("invalid input: {0}")]
    Invalid(String),

    /// JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SkymarkError {
    /// Build an error from a reqwest failure, classifying timeouts and
    /// connection problems as network errors.
    #[must_use]
    pub fn from_http(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Backend {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}
