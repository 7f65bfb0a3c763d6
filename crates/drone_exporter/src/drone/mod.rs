//! Drone CI API client.
//!
//! Implements [`crate::ci::CiClient`] over the Drone REST API.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for Drone API operations
//! - [`types`] - Wire types deserialized from API responses
//! - [`client`] - Client creation and requests
//! - [`convert`] - Conversion to CI records
//!
//! ```ignore
//! use drone_exporter::drone::{DroneClient, DEFAULT_TIMEOUT};
//!
//! let client = DroneClient::new("https://drone.example.com", "token", None, DEFAULT_TIMEOUT)?;
//! let repos = client.list_repos().await?;
//! ```

mod client;
mod convert;
mod error;
mod types;

pub use client::{DEFAULT_TIMEOUT, DroneClient};
pub use error::{DroneError, is_rate_limit_error, short_error_message};
pub use types::{DroneBuild, DroneRepo, DroneStage, DroneStep};
