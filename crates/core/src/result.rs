// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-result derivation: tracker snapshot + log buffer -> one `ExecutionResult`.

use crate::log::LogCollector;
use crate::tracker::{ProgressTracker, RowStatus, StepStatus, TrackedRow};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    Stopped,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    Iso,
    Unix,
    Locale,
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Iso
    }
}

pub fn render_timestamp(epoch_ms: u64, format: TimestampFormat) -> String {
    let secs = (epoch_ms / 1000) as i64;
    let nanos = ((epoch_ms % 1000) * 1_000_000) as u32;
    let dt = Utc.timestamp_opt(secs, nanos).single().unwrap_or_default();
    match format {
        TimestampFormat::Iso => dt.to_rfc3339(),
        TimestampFormat::Unix => epoch_ms.to_string(),
        TimestampFormat::Locale => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub row_index: usize,
    pub step_index: usize,
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowResultStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    pub index: usize,
    pub identifier: Option<String>,
    pub status: RowResultStatus,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: RunStatus,
    pub total_steps: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub total_rows: usize,
    pub completed_rows: usize,
    pub pass_rate: f64,
    pub start_time: String,
    pub end_time: String,
    pub duration_ms: u64,
    pub test_results: Vec<StepResult>,
    pub row_results: Option<Vec<RowResult>>,
    pub logs: String,
    pub was_stopped: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResultConfig {
    pub include_pending: bool,
    pub include_row_details: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            include_pending: false,
            include_row_details: true,
            timestamp_format: TimestampFormat::Iso,
        }
    }
}

fn row_status(row: &TrackedRow) -> RowResultStatus {
    if row.failed > 0 {
        RowResultStatus::Failed
    } else if row.passed == 0 && row.skipped > 0 {
        RowResultStatus::Skipped
    } else {
        RowResultStatus::Completed
    }
}

fn flatten_steps(rows: &[TrackedRow], include_pending: bool) -> Vec<StepResult> {
    let mut out = Vec::new();
    for row in rows {
        for step in &row.steps {
            if !include_pending && step.status == StepStatus::Pending {
                continue;
            }
            out.push(StepResult {
                row_index: row.index,
                step_index: step.index,
                id: step.id.clone(),
                name: step.name.clone(),
                status: step.status,
                duration_ms: step.duration_ms,
                error: step.error.clone(),
            });
        }
    }
    out
}

fn derive_status(was_stopped: bool, completed_steps: usize, failed_steps: usize) -> RunStatus {
    if was_stopped {
        RunStatus::Stopped
    } else if completed_steps == 0 {
        RunStatus::Pending
    } else if failed_steps > 0 {
        RunStatus::Failed
    } else {
        RunStatus::Completed
    }
}

/// Builds the terminal [`ExecutionResult`] from tracker + log state. Pure: does
/// not mutate either collaborator.
pub struct ResultAggregator {
    config: ResultConfig,
}

impl ResultAggregator {
    pub fn new(config: ResultConfig) -> Self {
        Self { config }
    }

    pub fn build<C: crate::clock::Clock>(
        &self,
        tracker: &ProgressTracker<C>,
        logs: &LogCollector<C>,
        was_stopped: bool,
        start_epoch_ms: u64,
        end_epoch_ms: u64,
        error_message: Option<String>,
    ) -> ExecutionResult {
        let snapshot = tracker.snapshot();
        let rows = tracker.rows();
        let completed_steps = snapshot.completed_steps();

        let status = derive_status(was_stopped, completed_steps, snapshot.failed_steps);
        let pass_rate = if snapshot.total_steps > 0 {
            round2(snapshot.passed_steps as f64 * 100.0 / snapshot.total_steps as f64)
        } else {
            0.0
        };

        let row_results = self.config.include_row_details.then(|| {
            rows.iter()
                .filter(|r| r.status != RowStatus::Pending)
                .map(|r| RowResult {
                    index: r.index,
                    identifier: r.identifier.clone(),
                    status: row_status(r),
                    passed: r.passed,
                    failed: r.failed,
                    skipped: r.skipped,
                })
                .collect()
        });

        ExecutionResult {
            status,
            total_steps: snapshot.total_steps,
            passed_steps: snapshot.passed_steps,
            failed_steps: snapshot.failed_steps,
            skipped_steps: snapshot.skipped_steps,
            total_rows: snapshot.total_rows,
            completed_rows: snapshot.completed_rows,
            pass_rate,
            start_time: render_timestamp(start_epoch_ms, self.config.timestamp_format),
            end_time: render_timestamp(end_epoch_ms, self.config.timestamp_format),
            duration_ms: end_epoch_ms.saturating_sub(start_epoch_ms),
            test_results: flatten_steps(&rows, self.config.include_pending),
            row_results,
            logs: logs.render(),
            was_stopped,
            error_message,
        }
    }
}

/// Status of an in-flight run, distinct from [`RunStatus`] (which only applies
/// once a run has terminated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialStatus {
    Running,
    Paused,
}

/// Live, in-progress projection for subscribers that need a result shape
/// before the run terminates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialResult {
    pub status: PartialStatus,
    pub percentage: f64,
    pub current_row: Option<usize>,
    pub current_step: Option<usize>,
    pub completed_steps: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub elapsed_ms: u64,
    pub estimated_remaining_ms: u64,
}

impl PartialResult {
    pub fn from_snapshot(snapshot: &crate::tracker::ProgressSnapshot) -> Self {
        let status = if snapshot.paused {
            PartialStatus::Paused
        } else {
            PartialStatus::Running
        };
        Self {
            status,
            percentage: snapshot.percentage,
            current_row: snapshot.current_row,
            current_step: snapshot.current_step,
            completed_steps: snapshot.completed_steps(),
            passed_steps: snapshot.passed_steps,
            failed_steps: snapshot.failed_steps,
            elapsed_ms: snapshot.elapsed_ms,
            estimated_remaining_ms: snapshot.estimated_remaining_ms,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Persistence projection. `logs` is always the single rendered string, never
/// a sequence — see the logs-as-string contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: crate::model::TestRunId,
    pub project_id: crate::model::ProjectId,
    pub status: RunStatus,
    pub start_time: String,
    pub end_time: Option<String>,
    pub total_steps: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub total_rows: usize,
    pub completed_rows: usize,
    pub test_results: Vec<StepResult>,
    pub logs: String,
    pub error_message: Option<String>,
}

impl TestRun {
    /// Map an `ExecutionResult` to its persistence projection. A user-requested
    /// stop persists as `failed` (the store doesn't distinguish "stopped").
    pub fn from_result(
        id: crate::model::TestRunId,
        project_id: crate::model::ProjectId,
        result: &ExecutionResult,
    ) -> Self {
        let status = match result.status {
            RunStatus::Stopped => RunStatus::Failed,
            other => other,
        };
        Self {
            id,
            project_id,
            status,
            start_time: result.start_time.clone(),
            end_time: Some(result.end_time.clone()),
            total_steps: result.total_steps,
            passed_steps: result.passed_steps,
            failed_steps: result.failed_steps,
            skipped_steps: result.skipped_steps,
            total_rows: result.total_rows,
            completed_rows: result.completed_rows,
            test_results: result.test_results.clone(),
            logs: result.logs.clone(),
            error_message: result.error_message.clone(),
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
