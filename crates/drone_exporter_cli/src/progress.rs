//! Progress reporting for export cycles.
//!
//! The daemon has no interactive mode: every event becomes a tracing event,
//! so output looks the same on a terminal and under a process supervisor.

mod logging;

use std::sync::Arc;

use drone_exporter::{ExportProgress, ProgressCallback};

use logging::LoggingReporter;

/// Progress reporter handed to the exporter.
pub struct ProgressReporter {
    inner: LoggingReporter,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            inner: LoggingReporter::new(),
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: ExportProgress) {
        self.inner.handle(event);
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> ProgressCallback {
        let reporter = Arc::clone(self);
        Box::new(move |event| {
            reporter.handle(event);
        })
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
