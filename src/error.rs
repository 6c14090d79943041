//! Error types for shiftsync
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in shiftsync
#[derive(Debug, Error)]
pub enum ShiftsyncError {
    /// No bearer credential available; raised before any network call
    #[error("No session: sign in first (no authorization token found)")]
    NoSession,

    /// Remote entity does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote service answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport failure (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShiftsyncError {
    /// True when the remote entity is gone, which lookups treat as a normal outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShiftsyncError::NotFound(_))
    }
}

impl From<reqwest::Error> for ShiftsyncError {
    fn from(err: reqwest::Error) -> Self {
        ShiftsyncError::Network(err.to_string())
    }
}

/// Result type alias for shiftsync operations
pub type Result<T> = std::result::Result<T, ShiftsyncError>;
