//! Flat, tagged measurements written to the metrics store.
//!
//! Each build yields one [`BuildPoint`], one [`StagePoint`] per stage and one
//! [`StepPoint`] per step. Field and tag names are part of the stored schema
//! (dashboards query them by name) and must not change.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::ci::BuildStatus;

/// Measurement holding one row per build.
pub const BUILDS_MEASUREMENT: &str = "builds";
/// Measurement holding one row per stage.
pub const STAGES_MEASUREMENT: &str = "stages";
/// Measurement holding one row per step.
pub const STEPS_MEASUREMENT: &str = "steps";

/// A field value of a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

pub type Tags = BTreeMap<String, String>;
pub type Fields = BTreeMap<String, FieldValue>;

/// Build-level measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPoint {
    pub time: DateTime<Utc>,
    pub address: String,
    pub slug: String,
    pub number: i64,
    pub status: BuildStatus,
    pub wait_time: i64,
    pub duration: i64,
    pub source: String,
    pub target: String,
    pub created: i64,
    pub started: i64,
    pub finished: i64,
}

/// Stage-level measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePoint {
    pub time: DateTime<Utc>,
    pub address: String,
    pub slug: String,
    pub sender: String,
    pub build_id: i64,
    pub name: String,
    pub os: String,
    pub arch: String,
    pub status: BuildStatus,
    pub wait_time: i64,
    pub duration: i64,
}

/// Step-level measurement. `duration` is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPoint {
    pub time: DateTime<Utc>,
    pub address: String,
    pub slug: String,
    pub sender: String,
    pub build_id: i64,
    pub name: String,
    pub status: BuildStatus,
    pub duration: i64,
}

/// One measurement destined for the metrics store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    Build(BuildPoint),
    Stage(StagePoint),
    Step(StepPoint),
}

impl Point {
    #[must_use]
    pub fn measurement(&self) -> &'static str {
        match self {
            Self::Build(_) => BUILDS_MEASUREMENT,
            Self::Stage(_) => STAGES_MEASUREMENT,
            Self::Step(_) => STEPS_MEASUREMENT,
        }
    }

    #[must_use]
    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Self::Build(p) => p.time,
            Self::Stage(p) => p.time,
            Self::Step(p) => p.time,
        }
    }

    /// Number of the build this point belongs to.
    #[must_use]
    pub fn build_number(&self) -> i64 {
        match self {
            Self::Build(p) => p.number,
            Self::Stage(p) => p.build_id,
            Self::Step(p) => p.build_id,
        }
    }

    /// Indexed tags.
    #[must_use]
    pub fn tags(&self) -> Tags {
        let mut tags = Tags::new();
        match self {
            Self::Build(p) => {
                tags.insert("DroneAddress".into(), p.address.clone());
                tags.insert("Slug".into(), p.slug.clone());
                tags.insert("Status".into(), p.status.to_string());
            }
            Self::Stage(p) => {
                tags.insert("DroneAddress".into(), p.address.clone());
                tags.insert("Slug".into(), p.slug.clone());
                tags.insert("Sender".into(), p.sender.clone());
                tags.insert("Name".into(), p.name.clone());
                tags.insert("OS".into(), p.os.clone());
                tags.insert("Arch".into(), p.arch.clone());
                tags.insert("Status".into(), p.status.to_string());
            }
            Self::Step(p) => {
                tags.insert("DroneAddress".into(), p.address.clone());
                tags.insert("Slug".into(), p.slug.clone());
                tags.insert("Sender".into(), p.sender.clone());
                tags.insert("Name".into(), p.name.clone());
                tags.insert("Status".into(), p.status.to_string());
            }
        }
        tags
    }

    /// Unindexed values.
    #[must_use]
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        match self {
            Self::Build(p) => {
                fields.insert("BuildId".into(), p.number.into());
                fields.insert("Number".into(), p.number.into());
                fields.insert("Status".into(), p.status.to_string().into());
                fields.insert("WaitTime".into(), p.wait_time.into());
                fields.insert("Duration".into(), p.duration.into());
                fields.insert("Source".into(), p.source.as_str().into());
                fields.insert("Target".into(), p.target.as_str().into());
                fields.insert("Created".into(), p.created.into());
                fields.insert("Started".into(), p.started.into());
                fields.insert("Finished".into(), p.finished.into());
            }
            Self::Stage(p) => {
                fields.insert("BuildId".into(), p.build_id.into());
                fields.insert("Name".into(), p.name.as_str().into());
                fields.insert("Status".into(), p.status.to_string().into());
                fields.insert("OS".into(), p.os.as_str().into());
                fields.insert("Arch".into(), p.arch.as_str().into());
                fields.insert("WaitTime".into(), p.wait_time.into());
                fields.insert("Duration".into(), p.duration.into());
            }
            Self::Step(p) => {
                fields.insert("BuildId".into(), p.build_id.into());
                fields.insert("Name".into(), p.name.as_str().into());
                fields.insert("Status".into(), p.status.to_string().into());
                fields.insert("Duration".into(), p.duration.into());
            }
        }
        fields
    }
}

/// Convert unix seconds to a timestamp; zero or out-of-range values map to the epoch.
#[must_use]
pub fn unix_time(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step() -> StepPoint {
        StepPoint {
            time: unix_time(200),
            address: "https://drone.example.com".to_string(),
            slug: "octocat/hello-world".to_string(),
            sender: "octocat".to_string(),
            build_id: 7,
            name: "test".to_string(),
            status: BuildStatus::Success,
            duration: 12,
        }
    }

    #[test]
    fn unix_time_maps_zero_to_epoch() {
        assert_eq!(unix_time(0), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(unix_time(100).timestamp(), 100);
    }

    #[test]
    fn step_point_tags_and_fields() {
        let point = Point::Step(step());
        assert_eq!(point.measurement(), STEPS_MEASUREMENT);
        assert_eq!(point.time().timestamp(), 200);
        assert_eq!(point.build_number(), 7);

        let tags = point.tags();
        assert_eq!(
            tags.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["DroneAddress", "Name", "Sender", "Slug", "Status"]
        );
        assert_eq!(tags["Status"], "success");

        let fields = point.fields();
        assert_eq!(fields["Duration"], FieldValue::Integer(12));
        assert_eq!(fields["BuildId"], FieldValue::Integer(7));
        assert_eq!(fields["Name"], FieldValue::Text("test".to_string()));
    }

    #[test]
    fn build_point_records_number_as_build_id() {
        let point = Point::Build(BuildPoint {
            time: unix_time(100),
            address: "https://drone.example.com".to_string(),
            slug: "octocat/hello-world".to_string(),
            number: 50,
            status: BuildStatus::Failure,
            wait_time: 10,
            duration: 40,
            source: "feature".to_string(),
            target: "main".to_string(),
            created: 90,
            started: 100,
            finished: 140,
        });
        assert_eq!(point.measurement(), BUILDS_MEASUREMENT);
        let fields = point.fields();
        assert_eq!(fields["BuildId"], FieldValue::Integer(50));
        assert_eq!(fields["Number"], FieldValue::Integer(50));
        assert_eq!(fields["WaitTime"], FieldValue::Integer(10));
        assert_eq!(point.tags()["Status"], "failure");
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::Integer(-3).to_string(), "-3");
        assert_eq!(FieldValue::from("x").to_string(), "x");
    }
}
