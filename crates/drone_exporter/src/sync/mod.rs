//! Per-repository build sync.
//!
//! # Module Structure
//!
//! - [`types`] - Options, results and constants: `SyncOptions`, `RepoSync`, `PAGE_SIZE`
//! - [`progress`] - Progress reporting: `ExportProgress`, `ProgressCallback`, `emit()`
//! - [`engine`] - The pagination and cutoff logic: `sync_repo()`
//!
//! # Example
//!
//! ```ignore
//! use drone_exporter::ci::Repo;
//! use drone_exporter::sync::{SyncOptions, sync_repo};
//!
//! let repo = Repo::new("octocat", "hello-world");
//! let result = sync_repo(&client, &repo, 42, &SyncOptions::default(), None).await?;
//! println!("{} new points", result.points.len());
//! ```

pub mod engine;
mod progress;
mod types;

pub use types::{PAGE_SIZE, RepoSync, ShortPagePolicy, SyncOptions, SyncStop};

pub use progress::{ExportProgress, ProgressCallback, emit};

pub use engine::sync_repo;
