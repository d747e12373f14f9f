// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain in-memory `Store`, guarded by an async-friendly lock.

use crate::error::StoreError;
use crate::store::{ProjectPatch, Store, TestRunPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tro_core::{Project, ProjectId, TestRun, TestRunId};

#[derive(Default)]
struct Tables {
    projects: HashMap<ProjectId, Project>,
    test_runs: HashMap<TestRunId, TestRun>,
}

/// Process-local, non-durable `Store`. Suitable for tests and for orchestrator
/// runs that don't need to survive the process.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronously seed a project. Only valid before the store is shared
    /// across tasks (construction time), where the lock is uncontended.
    pub fn seed_project(&self, project: Project) -> &Self {
        self.tables
            .try_lock()
            .expect("uncontended at seed time")
            .projects
            .insert(project.id.clone(), project);
        self
    }

    /// Synchronously seed a test run. See [`Self::seed_project`].
    pub fn seed_test_run(&self, run: TestRun) -> &Self {
        self.tables
            .try_lock()
            .expect("uncontended at seed time")
            .test_runs
            .insert(run.id.clone(), run);
        self
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.tables.lock().await.projects.get(id).cloned())
    }

    async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, StoreError> {
        let mut tables = self.tables.lock().await;
        let project = tables
            .projects
            .get_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        patch.apply(project);
        Ok(project.clone())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.tables.lock().await.projects.values().cloned().collect())
    }

    async fn delete_project(&self, id: &ProjectId) -> Result<bool, StoreError> {
        Ok(self.tables.lock().await.projects.remove(id).is_some())
    }

    async fn add_test_run(&self, run: TestRun) -> Result<TestRunId, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = run.id.clone();
        tables.test_runs.insert(id.clone(), run);
        Ok(id)
    }

    async fn update_test_run(
        &self,
        id: &TestRunId,
        patch: TestRunPatch,
    ) -> Result<TestRun, StoreError> {
        let mut tables = self.tables.lock().await;
        let run = tables
            .test_runs
            .get_mut(id)
            .ok_or_else(|| StoreError::TestRunNotFound(id.to_string()))?;
        patch.apply(run);
        Ok(run.clone())
    }

    async fn get_test_runs_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<TestRun>, StoreError> {
        let tables = self.tables.lock().await;
        let mut runs: Vec<TestRun> = tables
            .test_runs
            .values()
            .filter(|r| &r.project_id == project_id)
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(runs)
    }

    async fn get_test_run(&self, id: &TestRunId) -> Result<Option<TestRun>, StoreError> {
        Ok(self.tables.lock().await.test_runs.get(id).cloned())
    }
}

#[cfg(test)]
#[path = "in_memory_tests.rs"]
mod tests;
