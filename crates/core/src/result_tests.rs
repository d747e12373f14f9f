// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use crate::log::LogConfig;
use crate::tracker::ProgressConfig;
use std::time::Duration;

fn run_all_pass() -> (ProgressTracker<FakeClock>, LogCollector<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    let tracker = ProgressTracker::new(1, 3, clock.clone(), ProgressConfig::default());
    let logs = LogCollector::new(clock.clone(), LogConfig::default());
    tracker.start_execution();
    tracker.start_row(0, None);
    for s in 0..3 {
        tracker.start_step(0, s, &format!("s{s}"), "step");
        tracker.complete_step(0, s, StepStatus::Passed, Duration::from_millis(100), None);
        logs.success(format!("step {s} passed"));
    }
    tracker.complete_row(0);
    tracker.complete_execution();
    (tracker, logs, clock)
}

#[test]
fn s1_all_pass_produces_completed_result() {
    let (tracker, logs, clock) = run_all_pass();
    let agg = ResultAggregator::new(ResultConfig::default());
    let result = agg.build(&tracker, &logs, false, 1_000_000, clock.epoch_ms(), None);

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.passed_steps, 3);
    assert_eq!(result.failed_steps, 0);
    assert_eq!(result.test_results.len(), 3);
    assert_eq!(result.pass_rate, 100.0);
    assert!(result.logs.contains("step 0 passed"));
}

#[test]
fn s2_fail_fast_excludes_unattempted_step() {
    let clock = FakeClock::new();
    let tracker = ProgressTracker::new(1, 3, clock.clone(), ProgressConfig::default());
    let logs = LogCollector::new(clock.clone(), LogConfig::default());
    tracker.start_execution();
    tracker.start_row(0, None);
    tracker.start_step(0, 0, "s0", "step0");
    tracker.complete_step(0, 0, StepStatus::Passed, Duration::from_millis(10), None);
    tracker.start_step(0, 1, "s1", "step1");
    tracker.complete_step(
        0,
        1,
        StepStatus::Failed,
        Duration::from_millis(10),
        Some("Element not found".into()),
    );
    tracker.complete_row(0);

    let agg = ResultAggregator::new(ResultConfig::default());
    let result = agg.build(&tracker, &logs, false, 0, clock.epoch_ms(), None);

    assert_eq!(result.test_results.len(), 2);
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.test_results[1].error.as_deref(), Some("Element not found"));
}

#[test]
fn stopped_run_reports_stopped_but_persists_as_failed() {
    let (tracker, logs, clock) = run_all_pass();
    let agg = ResultAggregator::new(ResultConfig::default());
    let result = agg.build(&tracker, &logs, true, 0, clock.epoch_ms(), None);
    assert_eq!(result.status, RunStatus::Stopped);

    let test_run = TestRun::from_result(
        crate::model::TestRunId::new("r1"),
        crate::model::ProjectId::new("p1"),
        &result,
    );
    assert_eq!(test_run.status, RunStatus::Failed);
}

#[test]
fn pending_run_has_no_completed_steps() {
    let clock = FakeClock::new();
    let tracker = ProgressTracker::new(1, 3, clock.clone(), ProgressConfig::default());
    let logs = LogCollector::new(clock.clone(), LogConfig::default());
    let agg = ResultAggregator::new(ResultConfig::default());
    let result = agg.build(&tracker, &logs, false, 0, 0, None);
    assert_eq!(result.status, RunStatus::Pending);
}

#[test]
fn timestamp_rendering_modes() {
    let iso = render_timestamp(1_700_000_000_000, TimestampFormat::Iso);
    assert!(iso.contains('T'));
    let unix = render_timestamp(1_700_000_000_000, TimestampFormat::Unix);
    assert_eq!(unix, "1700000000000");
    let locale = render_timestamp(1_700_000_000_000, TimestampFormat::Locale);
    assert!(locale.contains("UTC"));
}
