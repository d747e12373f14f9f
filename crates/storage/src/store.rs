// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence collaborator: key-structured object stores for `Project` and `TestRun`.

use crate::error::StoreError;
use async_trait::async_trait;
use tro_core::{Project, ProjectId, RunStatus, StepResult, TestRun, TestRunId};

/// Partial update to a [`Project`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_url: Option<String>,
    pub steps: Option<Vec<tro_core::RecordedStep>>,
    pub field_mappings: Option<Vec<tro_core::FieldMapping>>,
    pub rows: Option<Option<Vec<tro_core::RowData>>>,
}

/// Partial update to a [`TestRun`], used for both the periodic partial commit
/// and the final commit. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TestRunPatch {
    pub status: Option<RunStatus>,
    pub end_time: Option<Option<String>>,
    pub total_steps: Option<usize>,
    pub passed_steps: Option<usize>,
    pub failed_steps: Option<usize>,
    pub skipped_steps: Option<usize>,
    pub completed_rows: Option<usize>,
    pub test_results: Option<Vec<StepResult>>,
    pub logs: Option<String>,
    pub error_message: Option<Option<String>>,
}

impl TestRunPatch {
    pub fn apply(&self, run: &mut TestRun) {
        if let Some(v) = &self.status {
            run.status = *v;
        }
        if let Some(v) = &self.end_time {
            run.end_time = v.clone();
        }
        if let Some(v) = self.total_steps {
            run.total_steps = v;
        }
        if let Some(v) = self.passed_steps {
            run.passed_steps = v;
        }
        if let Some(v) = self.failed_steps {
            run.failed_steps = v;
        }
        if let Some(v) = self.skipped_steps {
            run.skipped_steps = v;
        }
        if let Some(v) = self.completed_rows {
            run.completed_rows = v;
        }
        if let Some(v) = &self.test_results {
            run.test_results = v.clone();
        }
        if let Some(v) = &self.logs {
            run.logs = v.clone();
        }
        if let Some(v) = &self.error_message {
            run.error_message = v.clone();
        }
    }
}

impl ProjectPatch {
    pub fn apply(&self, project: &mut Project) {
        if let Some(v) = &self.name {
            project.name = v.clone();
        }
        if let Some(v) = &self.description {
            project.description = v.clone();
        }
        if let Some(v) = &self.target_url {
            project.target_url = v.clone();
        }
        if let Some(v) = &self.steps {
            project.steps = v.clone();
        }
        if let Some(v) = &self.field_mappings {
            project.field_mappings = v.clone();
        }
        if let Some(v) = &self.rows {
            project.rows = v.clone();
        }
    }
}

/// Key-structured object store for `Project` and `TestRun` records. Analogous
/// to the teacher's materialized state, without WAL/crash-recovery: single
/// writer per test run id (the orchestrator that created it).
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError>;
    async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, StoreError>;
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn delete_project(&self, id: &ProjectId) -> Result<bool, StoreError>;

    async fn add_test_run(&self, run: TestRun) -> Result<TestRunId, StoreError>;
    async fn update_test_run(
        &self,
        id: &TestRunId,
        patch: TestRunPatch,
    ) -> Result<TestRun, StoreError>;
    /// Sorted by `start_time` descending.
    async fn get_test_runs_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<TestRun>, StoreError>;
    async fn get_test_run(&self, id: &TestRunId) -> Result<Option<TestRun>, StoreError>;
}
