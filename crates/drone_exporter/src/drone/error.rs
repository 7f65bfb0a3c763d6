//! Error types for Drone API operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ci::CiError;
use crate::http::HttpError;

/// Errors that can occur when interacting with the Drone API.
#[derive(Debug, Error)]
pub enum DroneError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Authentication failed or token invalid.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Repository not found.
    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    /// Build not found.
    #[error("Build not found: {slug}#{number}")]
    BuildNotFound { slug: String, number: i64 },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<DroneError> for CiError {
    fn from(err: DroneError) -> Self {
        match err {
            DroneError::Http(e) => CiError::Network {
                message: e.to_string(),
            },
            DroneError::Json(e) => CiError::Internal {
                message: format!("JSON parse error: {}", e),
            },
            DroneError::Api { status, message } => {
                if status == 401 || status == 403 {
                    CiError::AuthRequired
                } else if status == 404 {
                    CiError::NotFound { resource: message }
                } else if status == 429 {
                    CiError::RateLimited {
                        reset_at: Utc::now() + chrono::Duration::minutes(1),
                    }
                } else {
                    CiError::Api {
                        message: format!("HTTP {}: {}", status, message),
                    }
                }
            }
            DroneError::RateLimited { reset_at } => CiError::RateLimited { reset_at },
            DroneError::Auth(_) => CiError::AuthRequired,
            DroneError::RepoNotFound(repo) => CiError::NotFound {
                resource: format!("repository: {}", repo),
            },
            DroneError::BuildNotFound { slug, number } => CiError::NotFound {
                resource: format!("build: {}#{}", slug, number),
            },
            DroneError::Config(msg) => CiError::Internal { message: msg },
        }
    }
}

/// Check if an error is a rate limit error.
pub fn is_rate_limit_error(err: &DroneError) -> bool {
    matches!(
        err,
        DroneError::RateLimited { .. } | DroneError::Api { status: 429, .. }
    )
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &DroneError) -> String {
    match err {
        DroneError::Http(HttpError::Timeout(_)) => "Request timed out".to_string(),
        DroneError::Http(_) => "Network error".to_string(),
        DroneError::Json(_) => "JSON parse error".to_string(),
        DroneError::Api { status, message } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        DroneError::RateLimited { .. } => "Rate limited".to_string(),
        DroneError::Auth(_) => "Authentication failed".to_string(),
        DroneError::RepoNotFound(repo) => format!("Repo not found: {}", repo),
        DroneError::BuildNotFound { slug, number } => {
            format!("Build not found: {}#{}", slug, number)
        }
        DroneError::Config(msg) => format!("Config: {}", msg),
    }
}
