//! Error types for InfluxDB operations.

use thiserror::Error;

use crate::http::HttpError;
use crate::store::StoreError;

/// Errors that can occur when talking to InfluxDB.
#[derive(Debug, Error)]
pub enum InfluxError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Error reported inside a query response body.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfluxError> for StoreError {
    fn from(err: InfluxError) -> Self {
        match err {
            InfluxError::Http(e) => StoreError::unavailable(e.to_string()),
            InfluxError::Json(e) => StoreError::malformed(e.to_string()),
            InfluxError::Status { status, message } => StoreError::rejected(status, message),
            InfluxError::Query(message) => StoreError::malformed(format!("query error: {message}")),
            InfluxError::Config(message) => StoreError::Config(message),
        }
    }
}
