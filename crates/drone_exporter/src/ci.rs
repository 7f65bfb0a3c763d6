//! CI server capability used by the sync engine.
//!
//! This module defines the `CiClient` trait and the platform-agnostic build
//! records (`Repo`, `BuildSummary`, `Build`, `Stage`, `Step`) it returns. The
//! Drone implementation lives in [`crate::drone`].
//!
//! # Example
//!
//! ```ignore
//! use drone_exporter::ci::CiClient;
//!
//! async fn newest<C: CiClient>(client: &C) -> Result<(), CiError> {
//!     for repo in client.list_repos().await? {
//!         let page = client.list_builds(&repo.namespace, &repo.name, 1, 1).await?;
//!         println!("{}: {:?}", repo.slug, page.first().map(|b| b.number));
//!     }
//!     Ok(())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{CiError, Result, short_error_message};
pub use rate_limit::ApiRateLimiter;
pub use types::{Build, BuildStatus, BuildSummary, CiClient, Repo, Stage, Step};
