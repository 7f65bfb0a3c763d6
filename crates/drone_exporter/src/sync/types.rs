//! Sync types and constants.

use std::fmt;
use std::str::FromStr;

use crate::point::Point;

/// Builds requested per page from the CI server.
pub const PAGE_SIZE: u32 = 25;

/// What to do with page-one points when the first page is shorter than a full page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortPagePolicy {
    /// Return no points. Repositories with fewer builds than one page are
    /// never exported under this policy.
    #[default]
    Discard,
    /// Return the points gathered from the first page.
    Keep,
}

impl FromStr for ShortPagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "keep" => Ok(Self::Keep),
            other => Err(format!(
                "unknown short page policy '{other}' (expected 'discard' or 'keep')"
            )),
        }
    }
}

/// Options for syncing one repository.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Builds per page.
    pub page_size: u32,
    pub short_page: ShortPagePolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            short_page: ShortPagePolicy::default(),
        }
    }
}

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStop {
    /// The repository has no builds.
    Empty,
    /// The newest build equals the cursor.
    UpToDate,
    /// The first page was shorter than a full page.
    ShortFirstPage,
    /// Pagination reached an empty page.
    Exhausted,
}

impl fmt::Display for SyncStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Empty => "empty",
            Self::UpToDate => "up-to-date",
            Self::ShortFirstPage => "short-first-page",
            Self::Exhausted => "exhausted",
        })
    }
}

/// Result of syncing one repository.
#[derive(Debug)]
pub struct RepoSync {
    /// Points ready to be written, in build order.
    pub points: Vec<Point>,
    /// Build-list pages requested.
    pub pages: u32,
    /// Build details fetched.
    pub builds: usize,
    /// Builds skipped because they were still running.
    pub skipped_running: usize,
    pub stop: SyncStop,
}

impl RepoSync {
    pub(crate) fn new() -> Self {
        Self {
            points: Vec::new(),
            pages: 0,
            builds: 0,
            skipped_running: 0,
            stop: SyncStop::Empty,
        }
    }
}
