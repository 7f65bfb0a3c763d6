//! Conversion from Drone API records to CI records.

use super::types::{DroneBuild, DroneRepo, DroneStage, DroneStep};
use crate::ci::{Build, BuildStatus, BuildSummary, Repo, Stage, Step};

/// Convert a Drone repository, deriving the slug when the API omitted it.
pub fn to_repo(repo: &DroneRepo) -> Repo {
    let slug = if repo.slug.is_empty() {
        format!("{}/{}", repo.namespace, repo.name)
    } else {
        repo.slug.clone()
    };
    Repo {
        id: repo.id,
        namespace: repo.namespace.clone(),
        name: repo.name.clone(),
        slug,
        active: repo.active,
    }
}

/// Convert a build-list entry.
pub fn to_build_summary(build: &DroneBuild) -> BuildSummary {
    BuildSummary {
        number: build.number,
        status: BuildStatus::parse(&build.status),
        sender: build.sender.clone(),
        created: build.created,
        started: build.started,
        finished: build.finished,
        updated: build.updated,
    }
}

/// Convert a build detail, including its stages and steps.
pub fn to_build(build: DroneBuild) -> Build {
    Build {
        id: build.id,
        number: build.number,
        status: BuildStatus::parse(&build.status),
        event: build.event,
        source: build.source,
        target: build.target,
        sender: build.sender,
        created: build.created,
        started: build.started,
        finished: build.finished,
        updated: build.updated,
        stages: build.stages.into_iter().map(to_stage).collect(),
    }
}

fn to_stage(stage: DroneStage) -> Stage {
    Stage {
        number: stage.number,
        name: stage.name,
        os: stage.os,
        arch: stage.arch,
        status: BuildStatus::parse(&stage.status),
        created: stage.created,
        started: stage.started,
        stopped: stage.stopped,
        updated: stage.updated,
        steps: stage.steps.into_iter().map(to_step).collect(),
    }
}

fn to_step(step: DroneStep) -> Step {
    Step {
        number: step.number,
        name: step.name,
        status: BuildStatus::parse(&step.status),
        exit_code: step.exit_code,
        started: step.started,
        stopped: step.stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_repo_derives_missing_slug() {
        let repo = DroneRepo {
            id: 3,
            namespace: "octocat".to_string(),
            name: "hello-world".to_string(),
            slug: String::new(),
            active: true,
        };
        let converted = to_repo(&repo);
        assert_eq!(converted.slug, "octocat/hello-world");
        assert_eq!(converted.id, 3);
        assert!(converted.active);
    }

    #[test]
    fn test_to_build_converts_nested_records() {
        let raw: DroneBuild = serde_json::from_str(
            r#"{
                "id": 100,
                "number": 42,
                "status": "failure",
                "event": "push",
                "source": "feature",
                "target": "main",
                "sender": "octocat",
                "created": 90,
                "started": 100,
                "finished": 140,
                "updated": 141,
                "stages": [{
                    "number": 1,
                    "name": "default",
                    "status": "failure",
                    "os": "linux",
                    "arch": "amd64",
                    "created": 91,
                    "started": 100,
                    "stopped": 139,
                    "updated": 139,
                    "steps": [
                        {"number": 1, "name": "clone", "status": "success", "exit_code": 0, "started": 100, "stopped": 105},
                        {"number": 2, "name": "test", "status": "failure", "exit_code": 1, "started": 105, "stopped": 139}
                    ]
                }]
            }"#,
        )
        .expect("valid build json");

        let build = to_build(raw);
        assert_eq!(build.number, 42);
        assert_eq!(build.status, BuildStatus::Failure);
        assert_eq!(build.stages.len(), 1);
        let stage = &build.stages[0];
        assert_eq!(stage.os, "linux");
        assert_eq!(stage.steps.len(), 2);
        assert_eq!(stage.steps[1].exit_code, 1);
        assert_eq!(stage.steps[1].status, BuildStatus::Failure);
    }

    #[test]
    fn test_to_build_summary_tolerates_missing_fields() {
        let raw: DroneBuild =
            serde_json::from_str(r#"{"number": 5, "status": "running"}"#).expect("valid json");
        let summary = to_build_summary(&raw);
        assert_eq!(summary.number, 5);
        assert!(summary.status.is_running());
        assert_eq!(summary.finished, 0);
    }
}
