//! Drone API data types.

use serde::Deserialize;

/// Drone repository - fields we need from the API response.
///
/// Only the fields the exporter reads are declared, which keeps the client
/// resilient to API additions.
///
/// API docs: https://docs.drone.io/api/user/user_repos/
#[derive(Debug, Clone, Deserialize)]
pub struct DroneRepo {
    /// Repository ID.
    pub id: i64,
    /// Owner (user or organization).
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// Full name including namespace (e.g., "octocat/hello-world").
    #[serde(default)]
    pub slug: String,
    /// Whether the repository is activated in Drone.
    #[serde(default)]
    pub active: bool,
}

/// Drone build, as returned by both the list and the detail endpoints.
///
/// The list endpoint omits `stages`.
///
/// API docs: https://docs.drone.io/api/builds/build_info/
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DroneBuild {
    pub id: i64,
    pub number: i64,
    pub status: String,
    pub event: String,
    pub source: String,
    pub target: String,
    pub sender: String,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
    pub updated: i64,
    pub stages: Vec<DroneStage>,
}

/// Drone stage.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DroneStage {
    pub id: i64,
    pub number: i64,
    pub name: String,
    pub status: String,
    pub os: String,
    pub arch: String,
    pub created: i64,
    pub started: i64,
    pub stopped: i64,
    pub updated: i64,
    pub steps: Vec<DroneStep>,
}

/// Drone step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DroneStep {
    pub id: i64,
    pub number: i64,
    pub name: String,
    pub status: String,
    pub exit_code: i64,
    pub started: i64,
    pub stopped: i64,
}
