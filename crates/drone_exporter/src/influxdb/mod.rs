//! InfluxDB v1 metrics store.
//!
//! Implements [`crate::store::MetricsStore`] over the InfluxDB 1.x HTTP API:
//! `/query` for the per-repository cursor and `/write` for line-protocol
//! batches.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for InfluxDB operations
//! - [`types`] - Query response wire types
//! - [`line_protocol`] - Point encoding and InfluxQL quoting
//! - [`client`] - The store itself

mod client;
mod error;
pub mod line_protocol;
mod types;

pub use client::{InfluxDb, MAX_POINTS_PER_WRITE};
pub use error::InfluxError;
