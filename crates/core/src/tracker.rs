// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row/step progress tracking: a two-level state machine with a read-model
//! snapshot and an event bus.

use crate::bus::{Bus, Unsubscribe};
use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Status of a single tracked step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StepStatus::Pending | StepStatus::Running)
    }
}

/// Status of a row (one iteration of the step sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RowStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RowStatus::Completed | RowStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedStep {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

impl TrackedStep {
    fn pending(index: usize) -> Self {
        Self {
            index,
            id: String::new(),
            name: String::new(),
            status: StepStatus::Pending,
            duration_ms: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedRow {
    pub index: usize,
    pub identifier: Option<String>,
    pub status: RowStatus,
    pub steps: Vec<TrackedStep>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl TrackedRow {
    fn new(index: usize, steps_per_row: usize) -> Self {
        Self {
            index,
            identifier: None,
            status: RowStatus::Pending,
            steps: (0..steps_per_row).map(TrackedStep::pending).collect(),
            passed: 0,
            failed: 0,
            skipped: 0,
        }
    }

    fn reset(&mut self) {
        let n = self.steps.len();
        self.status = RowStatus::Pending;
        self.steps = (0..n).map(TrackedStep::pending).collect();
        self.passed = 0;
        self.failed = 0;
        self.skipped = 0;
    }
}

/// Read-only, point-in-time view of tracker state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub total_rows: usize,
    pub steps_per_row: usize,
    pub total_steps: usize,
    pub current_row: Option<usize>,
    pub current_step: Option<usize>,
    pub completed_rows: usize,
    pub passed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub percentage: f64,
    pub elapsed_ms: u64,
    pub average_step_duration_ms: u64,
    pub estimated_remaining_ms: u64,
    pub running: bool,
    pub paused: bool,
}

impl ProgressSnapshot {
    pub fn completed_steps(&self) -> usize {
        self.passed_steps + self.failed_steps + self.skipped_steps
    }
}

/// Lifecycle and row/step transition events emitted by the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    #[serde(rename = "execution_started")]
    ExecutionStarted { snapshot: ProgressSnapshot },
    #[serde(rename = "execution_paused")]
    ExecutionPaused { snapshot: ProgressSnapshot },
    #[serde(rename = "execution_resumed")]
    ExecutionResumed { snapshot: ProgressSnapshot },
    #[serde(rename = "execution_stopped")]
    ExecutionStopped { snapshot: ProgressSnapshot },
    #[serde(rename = "execution_completed")]
    ExecutionCompleted { snapshot: ProgressSnapshot },
    #[serde(rename = "row_started")]
    RowStarted { row: usize, snapshot: ProgressSnapshot },
    #[serde(rename = "row_completed")]
    RowCompleted { row: usize, snapshot: ProgressSnapshot },
    #[serde(rename = "step_started")]
    StepStarted {
        row: usize,
        step: usize,
        snapshot: ProgressSnapshot,
    },
    #[serde(rename = "step_completed")]
    StepCompleted {
        row: usize,
        step: usize,
        status: StepStatus,
        snapshot: ProgressSnapshot,
    },
    #[serde(rename = "progress_update")]
    ProgressUpdate { snapshot: ProgressSnapshot },
}

impl ProgressEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEvent::ExecutionStarted { .. } => "execution_started",
            ProgressEvent::ExecutionPaused { .. } => "execution_paused",
            ProgressEvent::ExecutionResumed { .. } => "execution_resumed",
            ProgressEvent::ExecutionStopped { .. } => "execution_stopped",
            ProgressEvent::ExecutionCompleted { .. } => "execution_completed",
            ProgressEvent::RowStarted { .. } => "row_started",
            ProgressEvent::RowCompleted { .. } => "row_completed",
            ProgressEvent::StepStarted { .. } => "step_started",
            ProgressEvent::StepCompleted { .. } => "step_completed",
            ProgressEvent::ProgressUpdate { .. } => "progress_update",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProgressConfig {
    pub update_interval: Duration,
    pub include_skipped_in_progress: bool,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_millis(500),
            include_skipped_in_progress: false,
        }
    }
}

struct RunState {
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    total_paused: Duration,
    running: bool,
    paused: bool,
    stopped: bool,
    current_row: Option<usize>,
    current_step: Option<usize>,
    step_durations: Vec<Duration>,
}

impl RunState {
    fn new() -> Self {
        Self {
            started_at: None,
            paused_at: None,
            total_paused: Duration::ZERO,
            running: false,
            paused: false,
            stopped: false,
            current_row: None,
            current_step: None,
            step_durations: Vec::new(),
        }
    }
}

/// Two-level row x step progress tracker with an event bus.
///
/// Owns no I/O; `C: Clock` makes elapsed-time accounting deterministic in tests.
pub struct ProgressTracker<C: Clock> {
    clock: C,
    config: ProgressConfig,
    rows: parking_lot::Mutex<Vec<TrackedRow>>,
    state: parking_lot::Mutex<RunState>,
    bus: Bus<ProgressEvent>,
}

impl<C: Clock> ProgressTracker<C> {
    pub fn new(total_rows: usize, steps_per_row: usize, clock: C, config: ProgressConfig) -> Self {
        let total_rows = total_rows.max(1);
        let rows = (0..total_rows)
            .map(|i| TrackedRow::new(i, steps_per_row))
            .collect();
        Self {
            clock,
            config,
            rows: parking_lot::Mutex::new(rows),
            state: parking_lot::Mutex::new(RunState::new()),
            bus: Bus::new(),
        }
    }

    pub fn on(
        &self,
        event_type: Option<&str>,
        listener: impl Fn(&ProgressEvent) + Send + Sync + 'static,
    ) -> Unsubscribe<ProgressEvent> {
        self.bus.subscribe(event_type.map(str::to_string), listener)
    }

    pub fn start_execution(&self) {
        {
            let mut state = self.state.lock();
            state.started_at = Some(self.clock.now());
            state.total_paused = Duration::ZERO;
            state.paused_at = None;
            state.running = true;
            state.paused = false;
            state.stopped = false;
        }
        let snapshot = self.snapshot();
        self.bus
            .emit("execution_started", &ProgressEvent::ExecutionStarted { snapshot });
    }

    pub fn pause_execution(&self) {
        let mut state = self.state.lock();
        if !state.running || state.paused || state.stopped {
            return;
        }
        state.paused = true;
        state.paused_at = Some(self.clock.now());
        drop(state);
        let snapshot = self.snapshot();
        self.bus
            .emit("execution_paused", &ProgressEvent::ExecutionPaused { snapshot });
    }

    pub fn resume_execution(&self) {
        let mut state = self.state.lock();
        if !state.paused {
            return;
        }
        if let Some(paused_at) = state.paused_at.take() {
            state.total_paused += self.clock.now().saturating_duration_since(paused_at);
        }
        state.paused = false;
        drop(state);
        let snapshot = self.snapshot();
        self.bus
            .emit("execution_resumed", &ProgressEvent::ExecutionResumed { snapshot });
    }

    pub fn stop_execution(&self) {
        let mut state = self.state.lock();
        if state.stopped {
            return;
        }
        state.stopped = true;
        state.running = false;
        state.paused = false;
        drop(state);
        let snapshot = self.snapshot();
        self.bus
            .emit("execution_stopped", &ProgressEvent::ExecutionStopped { snapshot });
    }

    pub fn complete_execution(&self) {
        let mut state = self.state.lock();
        if !state.running {
            return;
        }
        state.running = false;
        drop(state);
        let snapshot = self.snapshot();
        self.bus.emit(
            "execution_completed",
            &ProgressEvent::ExecutionCompleted { snapshot },
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn start_row(&self, row: usize, identifier: Option<String>) {
        let mut rows = self.rows.lock();
        let Some(tracked) = rows.get_mut(row) else {
            return;
        };
        tracked.reset();
        tracked.identifier = identifier;
        tracked.status = RowStatus::Running;
        drop(rows);
        self.state.lock().current_row = Some(row);
        let snapshot = self.snapshot();
        self.bus
            .emit("row_started", &ProgressEvent::RowStarted { row, snapshot });
    }

    pub fn complete_row(&self, row: usize) {
        {
            let mut rows = self.rows.lock();
            let Some(tracked) = rows.get_mut(row) else {
                return;
            };
            tracked.status = if tracked.failed > 0 {
                RowStatus::Failed
            } else {
                RowStatus::Completed
            };
        }
        let snapshot = self.snapshot();
        self.bus
            .emit("row_completed", &ProgressEvent::RowCompleted { row, snapshot });
    }

    pub fn start_step(&self, row: usize, step: usize, id: &str, name: &str) {
        {
            let mut rows = self.rows.lock();
            let Some(tracked) = rows.get_mut(row) else {
                return;
            };
            let Some(s) = tracked.steps.get_mut(step) else {
                return;
            };
            s.id = id.to_string();
            s.name = name.to_string();
            s.status = StepStatus::Running;
        }
        self.state.lock().current_step = Some(step);
        let snapshot = self.snapshot();
        self.bus.emit(
            "step_started",
            &ProgressEvent::StepStarted { row, step, snapshot },
        );
    }

    /// Complete a step. `duration` is recorded verbatim; callers derive it from
    /// their own started-at timestamp rather than relying on the tracker's clock,
    /// since a step may be timed across an awaited transport call.
    pub fn complete_step(
        &self,
        row: usize,
        step: usize,
        status: StepStatus,
        duration: Duration,
        error: Option<String>,
    ) {
        {
            let mut rows = self.rows.lock();
            let Some(tracked) = rows.get_mut(row) else {
                return;
            };
            let Some(s) = tracked.steps.get_mut(step) else {
                return;
            };
            if let Some(prev) = previous_terminal_counter(s.status) {
                decrement(tracked, prev);
            }
            s.status = status;
            s.duration_ms = Some(duration.as_millis() as u64);
            s.error = error;
            increment(tracked, status);
        }
        if duration > Duration::ZERO {
            self.state.lock().step_durations.push(duration);
        }
        let snapshot = self.snapshot();
        self.bus.emit(
            "step_completed",
            &ProgressEvent::StepCompleted {
                row,
                step,
                status,
                snapshot,
            },
        );
    }

    /// Re-classify an already-terminal step's status, keeping row counters consistent.
    pub fn update_step_status(&self, row: usize, step: usize, status: StepStatus) {
        let mut rows = self.rows.lock();
        let Some(tracked) = rows.get_mut(row) else {
            return;
        };
        let Some(s) = tracked.steps.get_mut(step) else {
            return;
        };
        if let Some(prev) = previous_terminal_counter(s.status) {
            decrement(tracked, prev);
        }
        s.status = status;
        increment(tracked, status);
    }

    pub fn rows(&self) -> Vec<TrackedRow> {
        self.rows.lock().clone()
    }

    pub fn row(&self, index: usize) -> Option<TrackedRow> {
        self.rows.lock().get(index).cloned()
    }

    pub fn emit_progress_update(&self) {
        let snapshot = self.snapshot();
        self.bus
            .emit("progress_update", &ProgressEvent::ProgressUpdate { snapshot });
    }

    pub fn should_emit_periodic_updates(&self) -> bool {
        self.config.update_interval > Duration::ZERO && self.is_running() && !self.is_paused()
    }

    pub fn update_interval(&self) -> Duration {
        self.config.update_interval
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let rows = self.rows.lock();
        let state = self.state.lock();
        let total_rows = rows.len();
        let steps_per_row = rows.first().map(|r| r.steps.len()).unwrap_or(0);
        let total_steps = total_rows * steps_per_row;

        let (mut passed, mut failed, mut skipped, mut completed_rows) = (0, 0, 0, 0);
        for row in rows.iter() {
            passed += row.passed;
            failed += row.failed;
            skipped += row.skipped;
            if row.status.is_terminal() {
                completed_rows += 1;
            }
        }

        let counted = passed
            + failed
            + if self.config.include_skipped_in_progress {
                skipped
            } else {
                0
            };
        let percentage = if total_steps > 0 {
            ((counted as f64) * 100.0 / total_steps as f64).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let percentage = (percentage * 100.0).round() / 100.0;

        let elapsed = match state.started_at {
            Some(started) => {
                let end = if state.paused {
                    state.paused_at.unwrap_or_else(|| self.clock.now())
                } else {
                    self.clock.now()
                };
                end.saturating_duration_since(started)
                    .saturating_sub(state.total_paused)
            }
            None => Duration::ZERO,
        };

        let avg = if state.step_durations.is_empty() {
            Duration::ZERO
        } else {
            let total: Duration = state.step_durations.iter().sum();
            total / state.step_durations.len() as u32
        };
        let completed = passed + failed + skipped;
        let remaining_steps = total_steps.saturating_sub(completed);
        let estimated_remaining = avg * remaining_steps as u32;

        ProgressSnapshot {
            total_rows,
            steps_per_row,
            total_steps,
            current_row: state.current_row,
            current_step: state.current_step,
            completed_rows,
            passed_steps: passed,
            failed_steps: failed,
            skipped_steps: skipped,
            percentage,
            elapsed_ms: elapsed.as_millis() as u64,
            average_step_duration_ms: avg.as_millis() as u64,
            estimated_remaining_ms: estimated_remaining.as_millis() as u64,
            running: state.running,
            paused: state.paused,
        }
    }

    /// Clear all state and subscriptions. Idempotent.
    pub fn dispose(&self) {
        self.bus.clear();
    }
}

fn previous_terminal_counter(status: StepStatus) -> Option<StepStatus> {
    status.is_terminal().then_some(status)
}

fn increment(row: &mut TrackedRow, status: StepStatus) {
    match status {
        StepStatus::Passed => row.passed += 1,
        StepStatus::Failed => row.failed += 1,
        StepStatus::Skipped => row.skipped += 1,
        StepStatus::Pending | StepStatus::Running => {}
    }
}

fn decrement(row: &mut TrackedRow, status: StepStatus) {
    match status {
        StepStatus::Passed => row.passed = row.passed.saturating_sub(1),
        StepStatus::Failed => row.failed = row.failed.saturating_sub(1),
        StepStatus::Skipped => row.skipped = row.skipped.saturating_sub(1),
        StepStatus::Pending | StepStatus::Running => {}
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
