// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-file-backed `Store` for process-local durability between orchestrator
//! invocations. Mirrors the teacher's snapshot atomic-write convention
//! (write to `.tmp`, then rename) without WAL replay.

use crate::error::StoreError;
use crate::in_memory::InMemoryStore;
use crate::store::{ProjectPatch, Store, TestRunPatch};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tro_core::{Project, ProjectId, TestRun, TestRunId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileImage {
    projects: Vec<Project>,
    test_runs: Vec<TestRun>,
}

/// A [`Store`] that keeps its data in-memory and flushes the full image to a
/// JSON file after every mutation. No partial writes are ever visible: the
/// file is replaced via `rename` after the new content is fully written.
pub struct JsonFileStore {
    inner: InMemoryStore,
    path: PathBuf,
}

impl JsonFileStore {
    /// Load an existing file at `path`, or start empty if it doesn't exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = InMemoryStore::new();
        if path.exists() {
            let bytes = std::fs::read(&path)?;
            let image: FileImage = serde_json::from_slice(&bytes)?;
            for project in image.projects {
                inner.seed_project(project);
            }
            for run in image.test_runs {
                inner.seed_test_run(run);
            }
        }
        Ok(Self { inner, path })
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let image = FileImage {
            projects: self.inner.list_projects().await?,
            test_runs: {
                let mut runs = Vec::new();
                for project in self.inner.list_projects().await? {
                    runs.extend(self.inner.get_test_runs_by_project(&project.id).await?);
                }
                runs
            },
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = std::fs::File::create(&tmp_path)?;
            let mut writer = std::io::BufWriter::new(file);
            serde_json::to_writer(&mut writer, &image)?;
            use std::io::Write;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        self.inner.get_project(id).await
    }

    async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, StoreError> {
        let project = self.inner.update_project(id, patch).await?;
        self.flush().await?;
        Ok(project)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.inner.list_projects().await
    }

    async fn delete_project(&self, id: &ProjectId) -> Result<bool, StoreError> {
        let deleted = self.inner.delete_project(id).await?;
        if deleted {
            self.flush().await?;
        }
        Ok(deleted)
    }

    async fn add_test_run(&self, run: TestRun) -> Result<TestRunId, StoreError> {
        let id = self.inner.add_test_run(run).await?;
        self.flush().await?;
        Ok(id)
    }

    async fn update_test_run(
        &self,
        id: &TestRunId,
        patch: TestRunPatch,
    ) -> Result<TestRun, StoreError> {
        let run = self.inner.update_test_run(id, patch).await?;
        self.flush().await?;
        Ok(run)
    }

    async fn get_test_runs_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<TestRun>, StoreError> {
        self.inner.get_test_runs_by_project(project_id).await
    }

    async fn get_test_run(&self, id: &TestRunId) -> Result<Option<TestRun>, StoreError> {
        self.inner.get_test_run(id).await
    }
}

#[cfg(test)]
#[path = "json_file_tests.rs"]
mod tests;
