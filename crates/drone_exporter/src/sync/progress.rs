//! Progress reporting types for export cycles.
//!
//! The library never installs a tracing subscriber. Callers that want
//! human-readable output pass a [`ProgressCallback`] and render these events
//! however they like.

use super::types::SyncStop;

/// Progress events emitted by the exporter and the sync engine.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ExportProgress {
    /// A cycle is starting.
    CycleStarted {
        /// Repositories selected for this cycle.
        repos: usize,
        /// Repositories listed by the CI server before filtering.
        listed: usize,
    },

    /// Loaded the stored cursor for a repository.
    CursorLoaded {
        slug: String,
        /// Newest recorded build number, 0 if none.
        cursor: i64,
    },

    /// The cursor query failed.
    CursorQueryFailed {
        slug: String,
        error: String,
        /// True when the repository is skipped, false when it is fully resynced.
        skipped: bool,
    },

    /// Fetched a page of builds.
    FetchedPage {
        slug: String,
        /// Page number (1-indexed).
        page: u32,
        /// Builds on this page.
        count: usize,
    },

    /// A build was still running and produced no points.
    SkippedRunningBuild { slug: String, number: i64 },

    /// Finished walking a repository's builds.
    RepoSynced {
        slug: String,
        builds: usize,
        points: usize,
        stop: SyncStop,
    },

    /// Points for a repository were written.
    BatchWritten { slug: String, points: usize },

    /// Writing a repository's points failed. The points are dropped.
    BatchFailed {
        slug: String,
        points: usize,
        error: String,
    },

    /// Reading builds for a repository failed.
    RepoFailed { slug: String, error: String },

    /// All repositories of the cycle finished.
    CycleComplete {
        written: usize,
        points: usize,
        failed: usize,
    },

    /// Sleeping until the next cycle.
    Sleeping {
        /// Seconds until the next cycle.
        seconds: u64,
    },

    /// Warning message (non-fatal).
    Warning { message: String },
}

/// Callback for progress updates.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: ExportProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
