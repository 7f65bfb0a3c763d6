//! In-memory CI server and metrics store shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use drone_exporter::ci::{self, Build, BuildStatus, BuildSummary, CiClient, CiError, Repo};
use drone_exporter::point::Point;
use drone_exporter::store::{self, MetricsStore, StoreError};

pub const DRONE_URL: &str = "https://drone.example.com";

/// A finished build with fixed timings: waits 10s, runs 40s.
pub fn build(number: i64) -> Build {
    Build {
        id: number + 1000,
        number,
        status: BuildStatus::Success,
        event: "push".to_string(),
        source: "main".to_string(),
        target: "main".to_string(),
        sender: "octocat".to_string(),
        created: 90,
        started: 100,
        finished: 140,
        updated: 141,
        stages: Vec::new(),
    }
}

/// Builds `from` down to `to`, newest first.
pub fn builds(from: i64, to: i64) -> Vec<Build> {
    (to..=from).rev().map(build).collect()
}

/// Fake CI server serving fixed pages per repository.
#[derive(Default)]
pub struct FakeCi {
    pub repos: Vec<Repo>,
    /// Pages per slug; page N is `pages[N - 1]`, missing pages are empty.
    pub pages: HashMap<String, Vec<Vec<Build>>>,
    pub fail_list_repos: bool,
    pub fail_builds_for: HashSet<String>,
    /// Delay applied to every build-list request.
    pub latency: Option<Duration>,
    pub list_repos_calls: AtomicUsize,
    pub page_requests: Mutex<Vec<(String, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeCi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, slug: &str, pages: Vec<Vec<Build>>) -> Self {
        let (namespace, name) = slug.split_once('/').unwrap_or(("octocat", slug));
        self.repos.push(Repo::new(namespace, name));
        self.pages.insert(slug.to_string(), pages);
        self
    }

    pub fn requested_pages(&self, slug: &str) -> Vec<u32> {
        self.page_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == slug)
            .map(|(_, p)| *p)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn find_build(&self, slug: &str, number: i64) -> Option<Build> {
        self.pages
            .get(slug)?
            .iter()
            .flatten()
            .find(|b| b.number == number)
            .cloned()
    }
}

#[async_trait]
impl CiClient for FakeCi {
    fn base_url(&self) -> &str {
        DRONE_URL
    }

    async fn list_repos(&self) -> ci::Result<Vec<Repo>> {
        self.list_repos_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_repos {
            return Err(CiError::AuthRequired);
        }
        Ok(self.repos.clone())
    }

    async fn list_builds(
        &self,
        namespace: &str,
        name: &str,
        page: u32,
        _page_size: u32,
    ) -> ci::Result<Vec<BuildSummary>> {
        let slug = format!("{namespace}/{name}");
        self.page_requests
            .lock()
            .unwrap()
            .push((slug.clone(), page));

        let depth = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(depth, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_builds_for.contains(&slug) {
            return Err(CiError::network("connection reset by peer"));
        }

        let page = self
            .pages
            .get(&slug)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default();
        Ok(page
            .into_iter()
            .map(|b| BuildSummary {
                number: b.number,
                status: b.status,
                sender: b.sender,
                created: b.created,
                started: b.started,
                finished: b.finished,
                updated: b.updated,
            })
            .collect())
    }

    async fn get_build(&self, namespace: &str, name: &str, number: i64) -> ci::Result<Build> {
        let slug = format!("{namespace}/{name}");
        self.find_build(&slug, number)
            .ok_or_else(|| CiError::not_found(format!("{slug}#{number}")))
    }
}

/// Metrics store keeping points in memory.
///
/// A successful batch advances the slug's cursor to its newest build point.
#[derive(Default)]
pub struct MemoryStore {
    pub cursors: Mutex<HashMap<String, i64>>,
    pub points: Mutex<Vec<Point>>,
    pub fail_cursor_for: HashSet<String>,
    pub fail_batch_for: HashSet<String>,
    pub batch_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(self, slug: &str, cursor: i64) -> Self {
        self.cursors.lock().unwrap().insert(slug.to_string(), cursor);
        self
    }

    pub fn points_for(&self, slug: &str) -> Vec<Point> {
        self.points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.tags().get("Slug").map(String::as_str) == Some(slug))
            .cloned()
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.points.lock().unwrap().len()
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn last_build_number(&self, slug: &str) -> store::Result<Option<i64>> {
        if self.fail_cursor_for.contains(slug) {
            return Err(StoreError::unavailable("connection refused"));
        }
        Ok(self.cursors.lock().unwrap().get(slug).copied())
    }

    async fn batch(&self, points: &[Point]) -> store::Result<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let Some(slug) = points.first().and_then(|p| p.tags().get("Slug").cloned()) else {
            return Ok(());
        };
        if self.fail_batch_for.contains(&slug) {
            return Err(StoreError::rejected(500, "write failed"));
        }

        let newest = points
            .iter()
            .filter(|p| matches!(p, Point::Build(_)))
            .map(Point::build_number)
            .max();
        if let Some(newest) = newest {
            let mut cursors = self.cursors.lock().unwrap();
            let cursor = cursors.entry(slug).or_insert(0);
            *cursor = (*cursor).max(newest);
        }
        self.points.lock().unwrap().extend_from_slice(points);
        Ok(())
    }
}
