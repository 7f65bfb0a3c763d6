use std::fmt;

use async_trait::async_trait;

use super::errors::Result;

/// A repository known to the CI server.
///
/// Snapshot taken once per export cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repo {
    /// CI-assigned repository ID.
    pub id: i64,
    /// Owner (user or organization).
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// `namespace/name`, used as the store index key.
    pub slug: String,
    /// Whether the repository is activated on the CI server.
    pub active: bool,
}

impl Repo {
    /// Build a repository from its namespace and name, deriving the slug.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        Self {
            id: 0,
            slug: format!("{}/{}", namespace, name),
            namespace,
            name,
            active: true,
        }
    }
}

/// Lifecycle status of a build, stage or step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum BuildStatus {
    Skipped,
    Blocked,
    Declined,
    WaitingOnDependencies,
    #[default]
    Pending,
    Running,
    Success,
    Failure,
    Killed,
    Error,
    /// A status this client does not know about, kept verbatim.
    Other(String),
}

impl BuildStatus {
    /// Parse the CI server's lowercase status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "skipped" => Self::Skipped,
            "blocked" => Self::Blocked,
            "declined" => Self::Declined,
            "waiting_on_dependencies" => Self::WaitingOnDependencies,
            "pending" => Self::Pending,
            "running" => Self::Running,
            "success" => Self::Success,
            "failure" => Self::Failure,
            "killed" => Self::Killed,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Skipped => "skipped",
            Self::Blocked => "blocked",
            Self::Declined => "declined",
            Self::WaitingOnDependencies => "waiting_on_dependencies",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Killed => "killed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    /// In-flight builds are never exported.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a repository's build list.
///
/// Timestamps are unix seconds; zero means unset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub number: i64,
    pub status: BuildStatus,
    pub sender: String,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
    pub updated: i64,
}

/// Full build detail including stages and steps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Build {
    pub id: i64,
    pub number: i64,
    pub status: BuildStatus,
    pub event: String,
    pub source: String,
    pub target: String,
    pub sender: String,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
    pub updated: i64,
    pub stages: Vec<Stage>,
}

/// A pipeline stage of a build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stage {
    pub number: i64,
    pub name: String,
    pub os: String,
    pub arch: String,
    pub status: BuildStatus,
    pub created: i64,
    pub started: i64,
    pub stopped: i64,
    pub updated: i64,
    pub steps: Vec<Step>,
}

/// A single step of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    pub number: i64,
    pub name: String,
    pub status: BuildStatus,
    pub exit_code: i64,
    pub started: i64,
    pub stopped: i64,
}

/// Read-only capability set the exporter needs from a CI server.
///
/// Implementors should convert transport and API errors to `CiError` and
/// apply their own per-request deadlines; the sync engine does not retry.
#[async_trait]
pub trait CiClient: Send + Sync {
    /// Base URL of the CI server, recorded on every point.
    fn base_url(&self) -> &str;

    /// List every repository visible to the configured token.
    async fn list_repos(&self) -> Result<Vec<Repo>>;

    /// List one page of builds, newest first. Pages start at 1.
    async fn list_builds(
        &self,
        namespace: &str,
        name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<BuildSummary>>;

    /// Fetch one build with its stages and steps.
    async fn get_build(&self, namespace: &str, name: &str, number: i64) -> Result<Build>;
}
