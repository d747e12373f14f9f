// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controller::TabCommand;
use tro_core::{EventKind, RecordedStep, StepId};

fn step(id: &str) -> RecordedStep {
    RecordedStep {
        id: StepId::new(id),
        name: id.to_string(),
        kind: EventKind::Click,
        locator: "#btn".to_string(),
        wait_ms: None,
    }
}

#[tokio::test]
async fn open_tab_records_call_and_creates_entry() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();
    assert_eq!(info.url, "https://example.com");
    assert!(fake.get_tab(&info.tab_id).is_some());
    assert!(matches!(fake.calls()[0], TabCall::OpenTab { .. }));
}

#[tokio::test]
async fn injection_failure_then_success_is_scriptable() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();
    fake.fail_injection_times(2);

    assert!(fake.inject_script(&info.tab_id).await.is_err());
    assert!(fake.inject_script(&info.tab_id).await.is_err());
    assert!(fake.inject_script(&info.tab_id).await.is_ok());
    assert!(fake.get_tab(&info.tab_id).unwrap().script_injected);
}

#[tokio::test]
async fn send_message_returns_queued_response_for_matching_step() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();
    fake.queue_response("step-1", Ok(TabResponse::Ok { ok: false, error: Some("boom".into()) }));

    let response = fake
        .send_message(
            &info.tab_id,
            TabCommand::RunStep { step: step("step-1"), value: None },
        )
        .await
        .unwrap();
    assert!(!response.is_ok());
    assert_eq!(response.error(), Some("boom"));
}

#[tokio::test]
async fn send_message_falls_back_to_default_then_ok() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();

    let response = fake
        .send_message(&info.tab_id, TabCommand::RunStep { step: step("step-2"), value: None })
        .await
        .unwrap();
    assert!(response.is_ok());

    fake.set_default_response(TabResponse::Ok { ok: false, error: Some("default-fail".into()) });
    let response = fake
        .send_message(&info.tab_id, TabCommand::RunStep { step: step("step-3"), value: None })
        .await
        .unwrap();
    assert!(!response.is_ok());
}

#[tokio::test]
async fn send_message_to_unknown_tab_errors() {
    let fake = FakeTabController::new();
    let unknown = tro_core::TabId::new("missing");
    let result = fake.send_message(&unknown, TabCommand::Ping).await;
    assert!(matches!(result, Err(TabError::NotFound(_))));
}

#[tokio::test]
async fn is_tab_ready_reflects_scripted_state() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();
    assert!(fake.is_tab_ready(&info.tab_id).await);

    fake.set_tab_ready(&info.tab_id, false);
    assert!(!fake.is_tab_ready(&info.tab_id).await);
}

#[tokio::test]
async fn close_tab_marks_closed_and_is_idempotent_on_unknown() {
    let fake = FakeTabController::new();
    let info = fake.open_tab("https://example.com").await.unwrap();
    assert!(fake.close_tab(&info.tab_id).await);
    assert!(!fake.get_tab(&info.tab_id).unwrap().open);

    let unknown = tro_core::TabId::new("missing");
    assert!(!fake.close_tab(&unknown).await);
}
