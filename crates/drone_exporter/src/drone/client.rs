//! Drone API client creation and requests.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;

use super::convert::{to_build, to_build_summary, to_repo};
use super::error::{DroneError, is_rate_limit_error, short_error_message};
use super::types::{DroneBuild, DroneRepo};
use crate::ci::{self, ApiRateLimiter, Build, BuildSummary, CiClient, Repo};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpTransport};
use crate::retry::{RetryConfig, with_retry};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Drone API client.
///
/// Authenticates with a personal token sent as a bearer token. Rate-limited
/// responses are retried with backoff; every other failure is returned.
#[derive(Clone)]
pub struct DroneClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
    rate_limiter: Option<ApiRateLimiter>,
    retry: RetryConfig,
}

impl DroneClient {
    /// Create a new Drone client.
    ///
    /// # Arguments
    ///
    /// * `host` - Drone server URL (e.g., "https://drone.example.com")
    /// * `token` - Personal API token
    /// * `rate_limiter` - Optional limiter shared by every request of this client
    /// * `timeout` - Deadline for each HTTP request
    pub fn new(
        host: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        timeout: StdDuration,
    ) -> Result<Self, DroneError> {
        if host.trim().is_empty() {
            return Err(DroneError::Config("Drone URL is empty".to_string()));
        }
        let transport =
            ReqwestTransport::with_timeout(timeout).map_err(|e| DroneError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            host,
            token,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        host: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            rate_limiter,
            retry: RetryConfig::default(),
        }
    }

    /// Override the backoff used for rate-limited responses.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the host URL.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Make an authenticated GET request against `/api{path}`.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, DroneError> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let request = HttpRequest::get(format!("{}/api{}", self.host, path))
            .with_header("Authorization", format!("Bearer {}", self.token));

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let message = response.body_text();
            return Err(match response.status {
                401 | 403 => DroneError::Auth(message),
                _ => DroneError::Api {
                    status: response.status,
                    message,
                },
            });
        }

        Ok(serde_json::from_slice(&response.body)?)
    }

    /// GET with backoff on rate-limit responses.
    async fn get_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, DroneError> {
        with_retry(
            || self.get::<T>(path),
            is_rate_limit_error,
            short_error_message,
            self.retry.clone(),
            path,
        )
        .await
    }

    /// List repositories visible to the token.
    pub async fn fetch_repos(&self) -> Result<Vec<DroneRepo>, DroneError> {
        self.get_with_retry("/user/repos").await
    }

    /// List one page of builds for a repository, newest first.
    pub async fn fetch_builds(
        &self,
        namespace: &str,
        name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<DroneBuild>, DroneError> {
        let path = format!(
            "/repos/{}/{}/builds?page={}&per_page={}",
            namespace, name, page, per_page
        );
        self.get_with_retry(&path).await.map_err(|e| match e {
            DroneError::Api { status: 404, .. } => {
                DroneError::RepoNotFound(format!("{}/{}", namespace, name))
            }
            other => other,
        })
    }

    /// Fetch one build with stages and steps.
    pub async fn fetch_build(
        &self,
        namespace: &str,
        name: &str,
        number: i64,
    ) -> Result<DroneBuild, DroneError> {
        let path = format!("/repos/{}/{}/builds/{}", namespace, name, number);
        self.get_with_retry(&path).await.map_err(|e| match e {
            DroneError::Api { status: 404, .. } => DroneError::BuildNotFound {
                slug: format!("{}/{}", namespace, name),
                number,
            },
            other => other,
        })
    }
}

#[async_trait]
impl CiClient for DroneClient {
    fn base_url(&self) -> &str {
        &self.host
    }

    async fn list_repos(&self) -> ci::Result<Vec<Repo>> {
        let repos = self.fetch_repos().await?;
        Ok(repos.iter().map(to_repo).collect())
    }

    async fn list_builds(
        &self,
        namespace: &str,
        name: &str,
        page: u32,
        page_size: u32,
    ) -> ci::Result<Vec<BuildSummary>> {
        let builds = self.fetch_builds(namespace, name, page, page_size).await?;
        Ok(builds.iter().map(to_build_summary).collect())
    }

    async fn get_build(&self, namespace: &str, name: &str, number: i64) -> ci::Result<Build> {
        let build = self.fetch_build(namespace, name, number).await?;
        Ok(to_build(build))
    }
}
