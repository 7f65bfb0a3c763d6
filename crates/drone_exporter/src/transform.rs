//! Flattening of build detail into points.
//!
//! Pure functions: no I/O and no failure path. Input is taken as-is.
//!
//! When a terminal timestamp (`started`, `finished`, `stopped`) is unset (zero)
//! the record's `updated` time stands in for it, so in-progress or aborted
//! records still produce a bounded value.

use crate::ci::{Build, Stage, Step};
use crate::point::{BuildPoint, Point, StagePoint, StepPoint, unix_time};

/// Values shared by every point of one repository.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// CI server base URL, stored as the `DroneAddress` tag.
    pub address: &'a str,
    /// Repository slug.
    pub slug: &'a str,
}

/// Seconds between creation and start.
#[inline]
#[must_use]
pub fn wait_time(created: i64, started: i64, updated: i64) -> i64 {
    if started > 0 {
        started - created
    } else {
        updated - created
    }
}

/// Seconds between start and end.
#[inline]
#[must_use]
pub fn run_duration(started: i64, ended: i64, updated: i64) -> i64 {
    if ended > 0 {
        ended - started
    } else {
        updated - started
    }
}

/// Step duration, floored at zero to absorb clock skew and unset stop times.
#[inline]
#[must_use]
pub fn step_duration(started: i64, stopped: i64) -> i64 {
    (stopped - started).max(0)
}

/// Flatten one build into its build, stage and step points.
///
/// Running builds yield nothing.
#[must_use]
pub fn build_points(ctx: &TransformContext<'_>, build: &Build) -> Vec<Point> {
    if build.status.is_running() {
        return Vec::new();
    }

    let step_count: usize = build.stages.iter().map(|s| s.steps.len()).sum();
    let mut points = Vec::with_capacity(1 + build.stages.len() + step_count);

    points.push(Point::Build(BuildPoint {
        time: unix_time(build.started),
        address: ctx.address.to_string(),
        slug: ctx.slug.to_string(),
        number: build.number,
        status: build.status.clone(),
        wait_time: wait_time(build.created, build.started, build.updated),
        duration: run_duration(build.started, build.finished, build.updated),
        source: build.source.clone(),
        target: build.target.clone(),
        created: build.created,
        started: build.started,
        finished: build.finished,
    }));

    for stage in &build.stages {
        points.push(stage_point(ctx, build, stage));
        points.extend(
            stage
                .steps
                .iter()
                .map(|step| step_point(ctx, build, step)),
        );
    }

    points
}

fn stage_point(ctx: &TransformContext<'_>, build: &Build, stage: &Stage) -> Point {
    Point::Stage(StagePoint {
        time: unix_time(stage.started),
        address: ctx.address.to_string(),
        slug: ctx.slug.to_string(),
        sender: build.sender.clone(),
        build_id: build.number,
        name: stage.name.clone(),
        os: stage.os.clone(),
        arch: stage.arch.clone(),
        status: stage.status.clone(),
        wait_time: wait_time(stage.created, stage.started, stage.updated),
        duration: run_duration(stage.started, stage.stopped, stage.updated),
    })
}

fn step_point(ctx: &TransformContext<'_>, build: &Build, step: &Step) -> Point {
    Point::Step(StepPoint {
        time: unix_time(step.started),
        address: ctx.address.to_string(),
        slug: ctx.slug.to_string(),
        sender: build.sender.clone(),
        build_id: build.number,
        name: step.name.clone(),
        status: step.status.clone(),
        duration: step_duration(step.started, step.stopped),
    })
}
