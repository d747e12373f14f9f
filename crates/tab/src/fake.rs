// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake tab controller for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::controller::{TabCommand, TabController, TabError, TabInfo, TabResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tro_core::TabId;

/// Recorded controller call
#[derive(Debug, Clone)]
pub enum TabCall {
    OpenTab { url: String },
    CloseTab { tab_id: TabId },
    InjectScript { tab_id: TabId },
    IsTabReady { tab_id: TabId },
    SendMessage { tab_id: TabId, command: TabCommand },
}

#[derive(Debug, Clone)]
pub struct FakeTab {
    pub url: String,
    pub script_injected: bool,
    pub ready: bool,
    pub open: bool,
}

struct FakeState {
    tabs: HashMap<TabId, FakeTab>,
    calls: Vec<TabCall>,
    next_id: u64,
    inject_failures_remaining: u32,
    responses: HashMap<String, VecDeque<Result<TabResponse, TabError>>>,
    default_response: Option<TabResponse>,
}

/// Fake tab controller for testing. Scriptable per-step responses via
/// [`FakeTabController::queue_response`]; unscripted sends fall back to
/// [`FakeTabController::set_default_response`], then to `{ok: true}`.
#[derive(Clone)]
pub struct FakeTabController {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeTabController {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                tabs: HashMap::new(),
                calls: Vec::new(),
                next_id: 0,
                inject_failures_remaining: 0,
                responses: HashMap::new(),
                default_response: None,
            })),
        }
    }
}

impl FakeTabController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TabCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get_tab(&self, tab_id: &TabId) -> Option<FakeTab> {
        self.inner.lock().tabs.get(tab_id).cloned()
    }

    /// Make the next N injection attempts fail before succeeding.
    pub fn fail_injection_times(&self, n: u32) {
        self.inner.lock().inject_failures_remaining = n;
    }

    /// Queue a response for a given step id (matched against `TabCommand::RunStep.step.id`).
    pub fn queue_response(&self, step_id: &str, response: Result<TabResponse, TabError>) {
        self.inner
            .lock()
            .responses
            .entry(step_id.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn set_default_response(&self, response: TabResponse) {
        self.inner.lock().default_response = Some(response);
    }

    pub fn set_tab_ready(&self, tab_id: &TabId, ready: bool) {
        if let Some(tab) = self.inner.lock().tabs.get_mut(tab_id) {
            tab.ready = ready;
        }
    }
}

#[async_trait]
impl TabController for FakeTabController {
    async fn open_tab(&self, url: &str) -> Result<TabInfo, TabError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::OpenTab { url: url.to_string() });
        inner.next_id += 1;
        let tab_id = TabId::new(format!("fake-tab-{}", inner.next_id));
        inner.tabs.insert(
            tab_id.clone(),
            FakeTab {
                url: url.to_string(),
                script_injected: false,
                ready: true,
                open: true,
            },
        );
        Ok(TabInfo {
            tab_id,
            url: url.to_string(),
            script_injected: false,
            created_at_ms: 0,
        })
    }

    async fn close_tab(&self, tab_id: &TabId) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::CloseTab { tab_id: tab_id.clone() });
        if let Some(tab) = inner.tabs.get_mut(tab_id) {
            tab.open = false;
            true
        } else {
            false
        }
    }

    async fn inject_script(&self, tab_id: &TabId) -> Result<(), TabError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::InjectScript { tab_id: tab_id.clone() });
        if inner.inject_failures_remaining > 0 {
            inner.inject_failures_remaining -= 1;
            return Err(TabError::Transport("injection failed".into()));
        }
        if let Some(tab) = inner.tabs.get_mut(tab_id) {
            tab.script_injected = true;
        }
        Ok(())
    }

    async fn is_tab_ready(&self, tab_id: &TabId) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::IsTabReady { tab_id: tab_id.clone() });
        inner.tabs.get(tab_id).map(|t| t.ready).unwrap_or(false)
    }

    async fn get_tab_info(&self, tab_id: &TabId) -> Option<TabInfo> {
        self.inner.lock().tabs.get(tab_id).map(|t| TabInfo {
            tab_id: tab_id.clone(),
            url: t.url.clone(),
            script_injected: t.script_injected,
            created_at_ms: 0,
        })
    }

    async fn send_message(
        &self,
        tab_id: &TabId,
        command: TabCommand,
    ) -> Result<TabResponse, TabError> {
        let mut inner = self.inner.lock();
        inner.calls.push(TabCall::SendMessage {
            tab_id: tab_id.clone(),
            command: command.clone(),
        });
        if !inner.tabs.contains_key(tab_id) {
            return Err(TabError::NotFound(tab_id.to_string()));
        }
        let step_id = match &command {
            TabCommand::RunStep { step, .. } => Some(step.id.as_str().to_string()),
            TabCommand::Ping => None,
        };
        if let Some(id) = step_id {
            if let Some(queue) = inner.responses.get_mut(&id) {
                if let Some(resp) = queue.pop_front() {
                    return resp;
                }
            }
        }
        if let Some(default) = &inner.default_response {
            return Ok(default.clone());
        }
        Ok(TabResponse::Ok { ok: true, error: None })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
