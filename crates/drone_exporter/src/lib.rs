//! Drone exporter - CI build history as time-series points.
//!
//! This library polls a Drone CI server for builds that have not been
//! recorded yet, flattens each build (build, stages, steps) into tagged
//! points, and appends them to a metrics store.
//!
//! # Module Structure
//!
//! - [`ci`] - The `CiClient` capability and build records
//! - [`drone`] - Drone REST implementation of `CiClient`
//! - [`store`] - The `MetricsStore` capability and the `Driver` registry
//! - [`influxdb`] - InfluxDB v1 implementation of `MetricsStore`
//! - [`transform`] - Build flattening into [`point::Point`]s
//! - [`sync`] - Incremental per-repository sync
//! - [`exporter`] - The periodic, concurrent cycle scheduler
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use drone_exporter::{Driver, DroneClient, Exporter, ExporterOptions, StoreSettings};
//! use tokio_util::sync::CancellationToken;
//!
//! let client = DroneClient::new("https://drone.example.com", &token, None, DEFAULT_TIMEOUT)?;
//! let store = Driver::InfluxDb.connect(&settings)?;
//! let exporter = Exporter::new(Arc::new(client), store, ExporterOptions::default());
//! exporter.run(CancellationToken::new()).await?;
//! ```

pub mod ci;
pub mod drone;
pub mod exporter;
pub mod http;
pub mod influxdb;
pub mod point;
pub mod retry;
pub mod store;
pub mod sync;
pub mod transform;

pub use ci::{ApiRateLimiter, CiClient, CiError};
pub use drone::DroneClient;
pub use exporter::{
    CursorPolicy, CycleReport, ExportError, Exporter, ExporterOptions, FailurePolicy, RepoOutcome,
};
pub use point::Point;
pub use store::{Driver, MetricsStore, StoreError, StoreSettings};
pub use sync::{ExportProgress, ProgressCallback, ShortPagePolicy, SyncOptions};
