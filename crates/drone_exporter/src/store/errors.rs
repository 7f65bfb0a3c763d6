use thiserror::Error;

/// Errors returned by a metrics store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached, or the request timed out.
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// The store answered with a non-success status.
    #[error("Store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The store answered with a body that could not be interpreted.
    #[error("Malformed store response: {message}")]
    Malformed { message: String },

    /// Invalid connection settings.
    #[error("Store configuration error: {0}")]
    Config(String),

    /// No backend is registered under this name.
    #[error("Unknown store driver: {0}")]
    UnknownDriver(String),
}

impl StoreError {
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    #[inline]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
