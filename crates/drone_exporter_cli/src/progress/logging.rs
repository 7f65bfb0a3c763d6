use drone_exporter::ExportProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: ExportProgress) {
        match event {
            ExportProgress::CycleStarted { repos, listed } => {
                tracing::info!(repos, listed, "Processing repositories");
            }

            ExportProgress::CursorLoaded { slug, cursor } => {
                tracing::debug!(repo = %slug, cursor, "Loaded last recorded build");
            }

            ExportProgress::CursorQueryFailed {
                slug,
                error,
                skipped,
            } => {
                if skipped {
                    tracing::warn!(repo = %slug, error = %error, "Cursor query failed, skipping repository");
                } else {
                    tracing::warn!(repo = %slug, error = %error, "Cursor query failed, resyncing all builds");
                }
            }

            ExportProgress::FetchedPage { slug, page, count } => {
                tracing::debug!(repo = %slug, page, count, "Fetched page");
            }

            ExportProgress::SkippedRunningBuild { slug, number } => {
                tracing::debug!(repo = %slug, build = number, "Skipping running build");
            }

            ExportProgress::RepoSynced {
                slug,
                builds,
                points,
                stop,
            } => {
                tracing::debug!(repo = %slug, builds, points, stop = %stop, "Repository synced");
            }

            ExportProgress::BatchWritten { slug, points } => {
                tracing::info!(repo = %slug, points, "Wrote points");
            }

            ExportProgress::BatchFailed {
                slug,
                points,
                error,
            } => {
                tracing::error!(repo = %slug, points, error = %error, "Failed to write points");
            }

            ExportProgress::RepoFailed { slug, error } => {
                tracing::error!(repo = %slug, error = %error, "Failed to read builds");
            }

            ExportProgress::CycleComplete {
                written,
                points,
                failed,
            } => {
                tracing::info!(written, points, failed, "Cycle complete");
            }

            ExportProgress::Sleeping { seconds } => {
                tracing::info!("Waiting {} minutes", seconds / 60);
            }

            ExportProgress::Warning { message } => {
                tracing::warn!("{}", message);
            }

            _ => {
                tracing::trace!("Unhandled progress event");
            }
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
