//! Error types for the Docside SDK.

use thiserror::Error;

/// Result type alias using the Docside Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Docside operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP/network request failed (transport-level retries already exhausted)
    #[error("Request error: {0}")]
    Request(String),

    /// The remote API rejected the presented token or credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User login was rejected with `invalid_grant` (stale credentials)
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// No usable session could be obtained
    #[error("Session error: {0}")]
    Session(String),

    /// Document not found on the remote service
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Polling for a document was cancelled via the coordinator
    #[error("Polling cancelled for document {0}")]
    Cancelled(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (fails before any network call)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for the login failure that triggers credential recovery.
    pub fn is_invalid_grant(&self) -> bool {
        matches!(self, Error::InvalidGrant(_))
    }

    /// Returns true if the poll operation was resolved as cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
