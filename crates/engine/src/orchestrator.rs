// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-loop façade: constructs a fresh `ProgressTracker`/`LogCollector` per
//! run, drives the row/step loop against a worker tab, and commits results.

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use tro_core::{
    Bus, Clock, LogCollector, PartialResult, Project, ProgressEvent, ProgressTracker,
    ResultAggregator, RowData, RunStatus, StepStatus, TestRun, TestRunId, Unsubscribe,
};
use tro_storage::{Store, TestRunPatch};
use tro_tab::{TabCommand, TabController, TabId};

/// Forwarded on the orchestrator's own bus: tracker lifecycle events plus a
/// synthetic `PartialResult` tick on the configured update interval.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    Progress(ProgressEvent),
    PartialResult(PartialResult),
}

/// State that exists only while a run is in flight. Constructed fresh by
/// [`Orchestrator::start`]; matches the spec's "no global TabController or
/// process-wide LogCollector" design note.
struct RunState<C: Clock + 'static> {
    tracker: Arc<ProgressTracker<C>>,
    logs: Arc<LogCollector<C>>,
    tab_id: Option<TabId>,
}

/// Runs one project to completion or to an explicit stop, emitting progress
/// and persisting a `TestRun`.
///
/// Construct once, call [`Orchestrator::start`] at most once per instance.
/// `pause`/`resume`/`stop` may be called concurrently from another task while
/// `start` is in flight (share the orchestrator behind its returned `Arc`).
pub struct Orchestrator<T: TabController, S: Store + 'static, C: Clock + 'static> {
    tab: Arc<T>,
    store: Arc<S>,
    clock: C,
    config: OrchestratorConfig,
    bus: Bus<OrchestratorEvent>,
    run: Mutex<Option<RunState<C>>>,
}

impl<T, S, C> Orchestrator<T, S, C>
where
    T: TabController,
    S: Store + 'static,
    C: Clock + 'static,
{
    pub fn new(tab: T, store: S, clock: C, config: OrchestratorConfig) -> Arc<Self> {
        Arc::new(Self {
            tab: Arc::new(tab),
            store: Arc::new(store),
            clock,
            config,
            bus: Bus::new(),
            run: Mutex::new(None),
        })
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&OrchestratorEvent) + Send + Sync + 'static,
    ) -> Unsubscribe<OrchestratorEvent> {
        self.bus.subscribe(None, listener)
    }

    /// Pause the in-flight run. A no-op if no run is in progress.
    pub fn pause(&self) {
        if let Some(run) = self.run.lock().as_ref() {
            run.tracker.pause_execution();
        }
    }

    /// Resume the in-flight run. A no-op if no run is in progress.
    pub fn resume(&self) {
        if let Some(run) = self.run.lock().as_ref() {
            run.tracker.resume_execution();
        }
    }

    /// Idempotent. Flips the tracker to the stopped path; the run loop's next
    /// check exits. Does not itself close the tab or await anything.
    pub fn stop(&self) {
        if let Some(run) = self.run.lock().as_ref() {
            run.tracker.stop_execution();
        }
    }

    fn validate(project: &Project) -> Result<(), OrchestratorError> {
        if project.target_url.trim().is_empty() {
            return Err(OrchestratorError::Precondition("missing target URL".into()));
        }
        if project.steps.is_empty() {
            return Err(OrchestratorError::Precondition("empty step sequence".into()));
        }
        Ok(())
    }

    /// Validate, construct the tracker/log collector, open the worker tab,
    /// run every row to completion or stop, and commit the final `TestRun`.
    ///
    /// Always returns `Ok` once a `TestRun` has been created; precondition
    /// and persistence failures that occur before any row executes are the
    /// only `Err` cases.
    pub async fn start(
        self: &Arc<Self>,
        project: Project,
    ) -> Result<tro_core::ExecutionResult, OrchestratorError> {
        Self::validate(&project)?;

        let total_rows = project.total_rows();
        let steps_per_row = project.steps_per_row();
        let tracker = Arc::new(ProgressTracker::new(
            total_rows,
            steps_per_row,
            self.clock.clone(),
            self.config.progress,
        ));
        let logs = Arc::new(LogCollector::new(self.clock.clone(), self.config.logs.clone()));

        {
            let bus = self.bus.clone();
            tracker.on(None, move |event: &ProgressEvent| {
                bus.emit("*", &OrchestratorEvent::Progress(event.clone()));
            });
        }

        *self.run.lock() = Some(RunState {
            tracker: Arc::clone(&tracker),
            logs: Arc::clone(&logs),
            tab_id: None,
        });

        let run_id = TestRunId::new();
        let start_epoch_ms = self.clock.epoch_ms();
        let start_time = tro_core::result::render_timestamp(
            start_epoch_ms,
            self.config.results.timestamp_format,
        );

        let pending = TestRun {
            id: run_id.clone(),
            project_id: project.id.clone(),
            status: RunStatus::Pending,
            start_time,
            end_time: None,
            total_steps: total_rows * steps_per_row,
            passed_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
            total_rows,
            completed_rows: 0,
            test_results: Vec::new(),
            logs: String::new(),
            error_message: None,
        };
        self.store.add_test_run(pending).await?;

        tracker.start_execution();
        logs.info(format!("execution started for '{}'", project.name));

        let span = tracing::info_span!("orchestrator_run", run_id = %run_id, project = %project.id);
        async {
            let fatal_error = self.drive(&project, &tracker, &logs).await;
            self.finalize(&run_id, &project, &tracker, &logs, start_epoch_ms, fatal_error)
                .await
        }
        .instrument(span)
        .await
    }

    /// Opens the tab and runs the row/step loop. Returns the error message
    /// for a fatal (pre-loop or tab-unreachable) failure, if any.
    async fn drive(
        self: &Arc<Self>,
        project: &Project,
        tracker: &Arc<ProgressTracker<C>>,
        logs: &Arc<LogCollector<C>>,
    ) -> Option<String> {
        let info = match self.tab.open_tab(&project.target_url).await {
            Ok(info) => info,
            Err(e) => {
                logs.error(format!("failed to open worker tab: {e}"));
                return Some(e.to_string());
            }
        };
        if let Some(run) = self.run.lock().as_mut() {
            run.tab_id = Some(info.tab_id.clone());
        }

        if !info.script_injected {
            if let Err(e) = self.tab.inject_script(&info.tab_id).await {
                logs.error(format!("content agent injection failed: {e}"));
                let _ = self.tab.close_tab(&info.tab_id).await;
                return Some(e.to_string());
            }
            logs.success("content agent injected");
        }

        let update_handle = self.spawn_partial_updates(Arc::clone(tracker));
        self.run_rows(project, &info.tab_id, tracker, logs).await;
        update_handle.abort();

        self.tab.close_tab(&info.tab_id).await;
        None
    }

    fn spawn_partial_updates(
        self: &Arc<Self>,
        tracker: Arc<ProgressTracker<C>>,
    ) -> tokio::task::JoinHandle<()> {
        let interval = self.config.progress.update_interval;
        let bus = self.bus.clone();
        tokio::spawn(async move {
            if interval == Duration::ZERO {
                return;
            }
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !tracker.is_running() || tracker.is_paused() {
                    continue;
                }
                tracker.emit_progress_update();
                let partial = PartialResult::from_snapshot(&tracker.snapshot());
                bus.emit("*", &OrchestratorEvent::PartialResult(partial));
            }
        })
    }

    async fn run_rows(
        self: &Arc<Self>,
        project: &Project,
        tab_id: &TabId,
        tracker: &Arc<ProgressTracker<C>>,
        logs: &Arc<LogCollector<C>>,
    ) {
        for row_index in 0..project.total_rows() {
            if tracker.is_stopped() {
                break;
            }
            let row_data: RowData = project
                .rows
                .as_ref()
                .and_then(|rows| rows.get(row_index))
                .cloned()
                .unwrap_or_default();

            tracker.start_row(row_index, None);
            logs.info(format!(
                "row {} started ({} of {})",
                row_index,
                row_index + 1,
                project.total_rows()
            ));

            self.run_row(project, tab_id, row_index, &row_data, tracker, logs).await;

            if let Some(row) = tracker.row(row_index) {
                logs.info(format!(
                    "row {} completed: {} passed, {} failed, {} skipped",
                    row_index, row.passed, row.failed, row.skipped
                ));
            }
        }
    }

    async fn run_row(
        self: &Arc<Self>,
        project: &Project,
        tab_id: &TabId,
        row_index: usize,
        row_data: &RowData,
        tracker: &Arc<ProgressTracker<C>>,
        logs: &Arc<LogCollector<C>>,
    ) {
        for (step_index, step) in project.steps.iter().enumerate() {
            if !Self::wait_while_paused(tracker).await {
                break;
            }

            tracker.start_step(row_index, step_index, step.id.as_str(), &step.name);
            logs.info(format!("step {} started: {}", step_index, step.name));

            let value = project.mapped_value(&step.id, row_data).map(str::to_string);
            let command = TabCommand::RunStep { step: step.clone(), value };

            let t0 = self.clock.now();
            let outcome = self.tab.send_message(tab_id, command).await;
            let duration = self.clock.now().saturating_duration_since(t0);

            match outcome {
                Err(e) => {
                    tracker.complete_step(row_index, step_index, StepStatus::Failed, duration, Some(e.to_string()));
                    logs.error(format!("step {} failed: {}", step_index, e));
                    break;
                }
                Ok(response) if response.is_ok() => {
                    tracker.complete_step(row_index, step_index, StepStatus::Passed, duration, None);
                    logs.success(format!("step {} completed", step_index));
                }
                Ok(response) => {
                    let error = response.error().unwrap_or("unknown error").to_string();
                    tracker.complete_step(row_index, step_index, StepStatus::Failed, duration, Some(error.clone()));
                    logs.error(format!("step {} failed: {}", step_index, error));
                    break;
                }
            }
        }
        tracker.complete_row(row_index);
    }

    /// Polls until resumed or stopped. Returns `false` if the row loop should
    /// abort (stopped), `true` if it's clear to dispatch the next step.
    async fn wait_while_paused(tracker: &Arc<ProgressTracker<C>>) -> bool {
        loop {
            if tracker.is_stopped() {
                return false;
            }
            if !tracker.is_paused() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn finalize(
        &self,
        run_id: &TestRunId,
        project: &Project,
        tracker: &ProgressTracker<C>,
        logs: &LogCollector<C>,
        start_epoch_ms: u64,
        fatal_error: Option<String>,
    ) -> Result<tro_core::ExecutionResult, OrchestratorError> {
        let was_stopped = tracker.is_stopped();
        tracker.complete_execution();

        let end_epoch_ms = self.clock.epoch_ms();
        let aggregator = ResultAggregator::new(self.config.results.clone());
        let result = aggregator.build(tracker, logs, was_stopped, start_epoch_ms, end_epoch_ms, fatal_error);

        let run = TestRun::from_result(run_id.clone(), project.id.clone(), &result);
        self.store
            .update_test_run(
                run_id,
                TestRunPatch {
                    status: Some(run.status),
                    end_time: Some(run.end_time.clone()),
                    total_steps: Some(run.total_steps),
                    passed_steps: Some(run.passed_steps),
                    failed_steps: Some(run.failed_steps),
                    skipped_steps: Some(run.skipped_steps),
                    completed_rows: Some(run.completed_rows),
                    test_results: Some(run.test_results.clone()),
                    logs: Some(run.logs.clone()),
                    error_message: Some(run.error_message.clone()),
                },
            )
            .await?;

        tracker.dispose();
        *self.run.lock() = None;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
