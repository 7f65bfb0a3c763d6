//! Metrics store capability.
//!
//! The exporter reads one cursor per repository (the newest build number
//! already recorded) and appends batches of points. Backends are selected by
//! [`Driver`]; the only shipped backend is [`crate::influxdb::InfluxDb`].

mod driver;
mod errors;

use async_trait::async_trait;

use crate::point::Point;

pub use driver::{Driver, StoreSettings};
pub use errors::{Result, StoreError};

/// A sink for points plus the cursor query the exporter needs.
///
/// Implementations must tolerate concurrent calls from several repository
/// tasks.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// Newest build number recorded for `slug`, or `None` when nothing is stored yet.
    async fn last_build_number(&self, slug: &str) -> Result<Option<i64>>;

    /// Persist `points`. An empty slice is a no-op.
    async fn batch(&self, points: &[Point]) -> Result<()>;

    /// Release backend resources.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl MetricsStore for Recorder {
        async fn last_build_number(&self, _slug: &str) -> Result<Option<i64>> {
            Ok(None)
        }

        async fn batch(&self, points: &[Point]) -> Result<()> {
            self.batches.lock().expect("lock").push(points.len());
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_close_succeeds() {
        let store = Recorder::default();
        store.batch(&[]).await.expect("batch");
        store.close().await.expect("close");
        assert_eq!(*store.batches.lock().expect("lock"), vec![0]);
    }

    #[test]
    fn store_error_messages() {
        assert!(
            StoreError::rejected(400, "bad line")
                .to_string()
                .contains("HTTP 400")
        );
        assert!(
            StoreError::UnknownDriver("mysql".to_string())
                .to_string()
                .contains("mysql")
        );
    }
}
