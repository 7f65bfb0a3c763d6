//! Cycle scheduler.
//!
//! Every cycle lists repositories, syncs each one in its own task under a
//! concurrency cap, writes the resulting points, and waits for all tasks
//! before deciding whether the cycle failed. Cycles repeat at a fixed
//! interval until the cancellation token fires.

mod types;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::ci::{CiClient, CiError, Repo};
use crate::store::MetricsStore;
use crate::sync::{ExportProgress, ProgressCallback, SyncOptions, emit, sync_repo};

pub use types::{
    CursorPolicy, CycleReport, DEFAULT_INTERVAL, DEFAULT_THREADS, ExportError, ExporterOptions,
    FailurePolicy, RepoOutcome, RepoReport,
};

/// Periodic exporter from a CI server to a metrics store.
pub struct Exporter {
    client: Arc<dyn CiClient>,
    store: Arc<dyn MetricsStore>,
    options: ExporterOptions,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl Exporter {
    pub fn new(
        client: Arc<dyn CiClient>,
        store: Arc<dyn MetricsStore>,
        options: ExporterOptions,
    ) -> Self {
        Self {
            client,
            store,
            options,
            on_progress: None,
        }
    }

    /// Deliver progress events to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn options(&self) -> &ExporterOptions {
        &self.options
    }

    /// Run cycles until `cancel` fires or a cycle fails.
    ///
    /// Cancellation lets repositories that already started finish, then
    /// returns `Ok(())`.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ExportError> {
        while !cancel.is_cancelled() {
            let report = self.run_cycle(&cancel).await?;
            tracing::debug!(
                repos = report.repos.len(),
                written = report.written(),
                points = report.points(),
                failed = report.failed(),
                "cycle finished"
            );

            if cancel.is_cancelled() {
                break;
            }

            emit(
                self.on_progress.as_deref(),
                ExportProgress::Sleeping {
                    seconds: self.options.interval.as_secs(),
                },
            );
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }

        tracing::debug!("exporter stopped");
        Ok(())
    }

    /// Run a single cycle.
    #[tracing::instrument(skip_all, fields(threads = self.options.threads))]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport, ExportError> {
        let listed = self
            .client
            .list_repos()
            .await
            .map_err(ExportError::ListRepos)?;
        let listed_count = listed.len();
        let repos = self.select(listed);

        emit(
            self.on_progress.as_deref(),
            ExportProgress::CycleStarted {
                repos: repos.len(),
                listed: listed_count,
            },
        );

        let semaphore = Arc::new(Semaphore::new(self.options.threads.max(1)));
        let mut handles: Vec<(String, JoinHandle<RepoOutcome>)> = Vec::with_capacity(repos.len());

        for repo in repos {
            let unit = RepoUnit {
                client: Arc::clone(&self.client),
                store: Arc::clone(&self.store),
                sync: self.options.sync.clone(),
                cursor_policy: self.options.cursor_policy,
                on_progress: self.on_progress.clone(),
            };
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let slug = repo.slug.clone();

            let handle = tokio::spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return RepoOutcome::Cancelled,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => {
                            return RepoOutcome::SyncFailed(CiError::internal(
                                "Semaphore closed unexpectedly",
                            ));
                        }
                    },
                };
                unit.process(&repo).await
            });
            handles.push((slug, handle));
        }

        let mut report = CycleReport::default();
        for (slug, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => RepoOutcome::Panicked {
                    message: e.to_string(),
                },
            };
            report.repos.push(RepoReport { slug, outcome });
        }

        emit(
            self.on_progress.as_deref(),
            ExportProgress::CycleComplete {
                written: report.written(),
                points: report.points(),
                failed: report.failed(),
            },
        );

        self.escalate(report)
    }

    /// Apply the repository allow-list.
    fn select(&self, listed: Vec<Repo>) -> Vec<Repo> {
        if self.options.repos.is_empty() {
            return listed;
        }
        listed
            .into_iter()
            .filter(|r| self.options.repos.iter().any(|s| s == &r.slug))
            .collect()
    }

    /// Turn the first unit failure into a cycle error under [`FailurePolicy::Abort`].
    fn escalate(&self, mut report: CycleReport) -> Result<CycleReport, ExportError> {
        if self.options.failure_policy == FailurePolicy::Continue {
            return Ok(report);
        }

        let failed = report.repos.iter().position(|r| {
            matches!(
                r.outcome,
                RepoOutcome::SyncFailed(_) | RepoOutcome::Panicked { .. }
            )
        });
        let Some(index) = failed else {
            return Ok(report);
        };

        let RepoReport { slug, outcome } = report.repos.swap_remove(index);
        Err(match outcome {
            RepoOutcome::SyncFailed(source) => ExportError::Sync { slug, source },
            RepoOutcome::Panicked { message } => ExportError::TaskPanicked { slug, message },
            other => ExportError::TaskPanicked {
                slug,
                message: format!("unexpected outcome {other:?}"),
            },
        })
    }
}

/// Everything one repository task needs.
struct RepoUnit {
    client: Arc<dyn CiClient>,
    store: Arc<dyn MetricsStore>,
    sync: SyncOptions,
    cursor_policy: CursorPolicy,
    on_progress: Option<Arc<ProgressCallback>>,
}

impl RepoUnit {
    #[tracing::instrument(skip_all, fields(slug = %repo.slug))]
    async fn process(&self, repo: &Repo) -> RepoOutcome {
        let on_progress = self.on_progress.as_deref();

        let cursor = match self.store.last_build_number(&repo.slug).await {
            Ok(cursor) => cursor.unwrap_or(0),
            Err(e) => {
                let skipped = self.cursor_policy == CursorPolicy::SkipRepository;
                tracing::warn!(error = %e, skipped, "cursor query failed");
                emit(
                    on_progress,
                    ExportProgress::CursorQueryFailed {
                        slug: repo.slug.clone(),
                        error: e.to_string(),
                        skipped,
                    },
                );
                if skipped {
                    return RepoOutcome::CursorSkipped {
                        error: e.to_string(),
                    };
                }
                0
            }
        };
        emit(
            on_progress,
            ExportProgress::CursorLoaded {
                slug: repo.slug.clone(),
                cursor,
            },
        );

        let synced = match sync_repo(self.client.as_ref(), repo, cursor, &self.sync, on_progress)
            .await
        {
            Ok(synced) => synced,
            Err(e) => {
                emit(
                    on_progress,
                    ExportProgress::RepoFailed {
                        slug: repo.slug.clone(),
                        error: e.to_string(),
                    },
                );
                return RepoOutcome::SyncFailed(e);
            }
        };

        if synced.points.is_empty() {
            return RepoOutcome::Unchanged;
        }

        let points = synced.points.len();
        match self.store.batch(&synced.points).await {
            Ok(()) => {
                emit(
                    on_progress,
                    ExportProgress::BatchWritten {
                        slug: repo.slug.clone(),
                        points,
                    },
                );
                RepoOutcome::Written { points }
            }
            Err(e) => {
                tracing::warn!(error = %e, points, "batch write failed");
                emit(
                    on_progress,
                    ExportProgress::BatchFailed {
                        slug: repo.slug.clone(),
                        points,
                        error: e.to_string(),
                    },
                );
                RepoOutcome::WriteFailed {
                    points,
                    error: e.to_string(),
                }
            }
        }
    }
}
