// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tro_core::{ProjectId, RunStatus, TestRunId};

fn sample_project(id: &str) -> Project {
    Project {
        id: ProjectId::new(id),
        name: "checkout flow".to_string(),
        description: String::new(),
        target_url: "https://example.com".to_string(),
        steps: Vec::new(),
        field_mappings: Vec::new(),
        rows: None,
    }
}

fn sample_run(id: &str, project_id: &str) -> TestRun {
    TestRun {
        id: TestRunId::new(id),
        project_id: ProjectId::new(project_id),
        status: RunStatus::Pending,
        start_time: "2026-01-01T00:00:00Z".to_string(),
        end_time: None,
        total_steps: 0,
        passed_steps: 0,
        failed_steps: 0,
        skipped_steps: 0,
        total_rows: 1,
        completed_rows: 0,
        test_results: Vec::new(),
        logs: String::new(),
        error_message: None,
    }
}

#[tokio::test]
async fn round_trips_projects_and_runs_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    {
        let store = JsonFileStore::open(&path).unwrap();
        store.inner.seed_project(sample_project("p1"));
        store.add_test_run(sample_run("r1", "p1")).await.unwrap();
    }

    let reopened = JsonFileStore::open(&path).unwrap();
    let project = reopened.get_project(&ProjectId::new("p1")).await.unwrap();
    assert!(project.is_some());
    let runs = reopened.get_test_runs_by_project(&ProjectId::new("p1")).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, TestRunId::new("r1"));
}

#[tokio::test]
async fn opening_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");
    let store = JsonFileStore::open(&path).unwrap();
    assert!(store.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_test_run_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = JsonFileStore::open(&path).unwrap();
    store.inner.seed_project(sample_project("p1"));
    let id = store.add_test_run(sample_run("r1", "p1")).await.unwrap();
    store
        .update_test_run(
            &id,
            TestRunPatch {
                status: Some(RunStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    drop(store);

    let reopened = JsonFileStore::open(&path).unwrap();
    let run = reopened.get_test_run(&id).await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}
