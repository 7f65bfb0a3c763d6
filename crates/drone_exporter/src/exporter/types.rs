//! Exporter options, outcomes and errors.

use std::str::FromStr;
use std::time::Duration as StdDuration;

use thiserror::Error;

use crate::ci::CiError;
use crate::sync::SyncOptions;

/// Default number of repositories processed concurrently.
pub const DEFAULT_THREADS: usize = 4;

/// Default pause between cycles.
pub const DEFAULT_INTERVAL: StdDuration = StdDuration::from_secs(15 * 60);

/// How a failed cursor query is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorPolicy {
    /// Treat the cursor as 0 and resync the whole repository.
    #[default]
    ResyncOnError,
    /// Leave the repository alone until the next cycle.
    SkipRepository,
}

impl FromStr for CursorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "resync" | "resync-on-error" => Ok(Self::ResyncOnError),
            "skip" | "skip-repository" => Ok(Self::SkipRepository),
            other => Err(format!(
                "unknown cursor policy '{other}' (expected 'resync' or 'skip')"
            )),
        }
    }
}

/// How a CI failure inside one repository affects the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Fail the cycle once every repository has finished.
    #[default]
    Abort,
    /// Record the failure and carry on.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'abort' or 'continue')"
            )),
        }
    }
}

/// Exporter configuration.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    /// Maximum repositories processed at once. Values below 1 are treated as 1.
    pub threads: usize,
    /// Pause between cycles.
    pub interval: StdDuration,
    pub sync: SyncOptions,
    pub cursor_policy: CursorPolicy,
    pub failure_policy: FailurePolicy,
    /// Slugs to export. Empty exports every listed repository.
    pub repos: Vec<String>,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            interval: DEFAULT_INTERVAL,
            sync: SyncOptions::default(),
            cursor_policy: CursorPolicy::default(),
            failure_policy: FailurePolicy::default(),
            repos: Vec::new(),
        }
    }
}

/// What happened to one repository during a cycle.
#[derive(Debug)]
pub enum RepoOutcome {
    /// Points were written.
    Written { points: usize },
    /// Nothing new to write.
    Unchanged,
    /// The store rejected the points; they were dropped.
    WriteFailed { points: usize, error: String },
    /// The cursor query failed and the repository was skipped.
    CursorSkipped { error: String },
    /// Reading builds failed.
    SyncFailed(CiError),
    /// The task panicked.
    Panicked { message: String },
    /// Cancelled before the repository started.
    Cancelled,
}

/// Outcome for one repository, keyed by slug.
#[derive(Debug)]
pub struct RepoReport {
    pub slug: String,
    pub outcome: RepoOutcome,
}

/// Aggregated outcomes of one cycle, in repository listing order.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub repos: Vec<RepoReport>,
}

impl CycleReport {
    /// Repositories whose points were written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::Written { .. }))
    }

    /// Total points written.
    #[must_use]
    pub fn points(&self) -> usize {
        self.repos
            .iter()
            .map(|r| match r.outcome {
                RepoOutcome::Written { points } => points,
                _ => 0,
            })
            .sum()
    }

    /// Repositories that failed for any reason.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RepoOutcome::WriteFailed { .. }
                    | RepoOutcome::CursorSkipped { .. }
                    | RepoOutcome::SyncFailed(_)
                    | RepoOutcome::Panicked { .. }
            )
        })
    }

    /// Repositories whose points could not be written.
    #[must_use]
    pub fn write_failures(&self) -> usize {
        self.count(|o| matches!(o, RepoOutcome::WriteFailed { .. }))
    }

    /// Outcome recorded for `slug`.
    #[must_use]
    pub fn outcome(&self, slug: &str) -> Option<&RepoOutcome> {
        self.repos
            .iter()
            .find(|r| r.slug == slug)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&RepoOutcome) -> bool) -> usize {
        self.repos.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Errors that end a cycle.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to list repositories: {0}")]
    ListRepos(#[source] CiError),

    #[error("failed to sync {slug}: {source}")]
    Sync {
        slug: String,
        #[source]
        source: CiError,
    },

    #[error("task for {slug} panicked: {message}")]
    TaskPanicked { slug: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<(&str, RepoOutcome)>) -> CycleReport {
        CycleReport {
            repos: outcomes
                .into_iter()
                .map(|(slug, outcome)| RepoReport {
                    slug: slug.to_string(),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn cycle_report_counts() {
        let report = report(vec![
            ("a/one", RepoOutcome::Written { points: 4 }),
            ("a/two", RepoOutcome::Written { points: 6 }),
            ("a/three", RepoOutcome::Unchanged),
            (
                "a/four",
                RepoOutcome::WriteFailed {
                    points: 3,
                    error: "HTTP 500".to_string(),
                },
            ),
            ("a/five", RepoOutcome::SyncFailed(CiError::network("reset"))),
        ]);
        assert_eq!(report.written(), 2);
        assert_eq!(report.points(), 10);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.write_failures(), 1);
        assert!(matches!(
            report.outcome("a/three"),
            Some(RepoOutcome::Unchanged)
        ));
        assert!(report.outcome("missing/repo").is_none());
    }

    #[test]
    fn policies_parse() {
        assert_eq!(
            "resync".parse::<CursorPolicy>().expect("parse"),
            CursorPolicy::ResyncOnError
        );
        assert_eq!(
            "skip_repository".parse::<CursorPolicy>().expect("parse"),
            CursorPolicy::SkipRepository
        );
        assert_eq!(
            "Continue".parse::<FailurePolicy>().expect("parse"),
            FailurePolicy::Continue
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn default_options() {
        let options = ExporterOptions::default();
        assert_eq!(options.threads, 4);
        assert_eq!(options.interval, StdDuration::from_secs(900));
        assert_eq!(options.sync.page_size, 25);
        assert_eq!(options.failure_policy, FailurePolicy::Abort);
        assert!(options.repos.is_empty());
    }

    #[test]
    fn export_error_display() {
        let err = ExportError::Sync {
            slug: "octocat/hello-world".to_string(),
            source: CiError::AuthRequired,
        };
        assert_eq!(
            err.to_string(),
            "failed to sync octocat/hello-world: Authentication required"
        );
    }
}
