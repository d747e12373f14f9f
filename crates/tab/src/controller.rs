// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-tab lifecycle and transport abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tro_core::TabId;

/// Errors from tab transport operations.
#[derive(Debug, Error)]
pub enum TabError {
    #[error("tab not found: {0}")]
    NotFound(String),
    #[error("open failed: {0}")]
    OpenFailed(String),
    #[error("injection exhausted after {attempts} attempts: {last_error}")]
    InjectionExhausted { attempts: u32, last_error: String },
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabInfo {
    pub tab_id: TabId,
    pub url: String,
    pub script_injected: bool,
    pub created_at_ms: u64,
}

/// A command sent to the content agent running inside a worker tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TabCommand {
    #[serde(rename = "runStep")]
    RunStep {
        step: tro_core::RecordedStep,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    #[serde(rename = "ping")]
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabResponse {
    Ok { ok: bool, error: Option<String> },
    Ping { ready: bool },
}

impl TabResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, TabResponse::Ok { ok: true, .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TabResponse::Ok { error, .. } => error.as_deref(),
            TabResponse::Ping { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TabResponse::Ping { ready: true })
    }
}

/// Abstracts the worker-tab lifecycle: open, inject, probe, message, close.
///
/// Implementations own a single host-process transport; one `TabController`
/// instance is used for exactly one run.
#[async_trait]
pub trait TabController: Send + Sync + 'static {
    async fn open_tab(&self, url: &str) -> Result<TabInfo, TabError>;
    async fn close_tab(&self, tab_id: &TabId) -> bool;
    async fn inject_script(&self, tab_id: &TabId) -> Result<(), TabError>;
    async fn is_tab_ready(&self, tab_id: &TabId) -> bool;
    async fn get_tab_info(&self, tab_id: &TabId) -> Option<TabInfo>;
    async fn send_message(
        &self,
        tab_id: &TabId,
        command: TabCommand,
    ) -> Result<TabResponse, TabError>;
}

#[derive(Debug, Clone, Copy)]
pub struct TabConfig {
    pub timeout: std::time::Duration,
    pub load_delay: std::time::Duration,
    pub max_injection_retries: u32,
    pub injection_retry_delay: std::time::Duration,
    pub wait_for_load: bool,
    pub ping_timeout: std::time::Duration,
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            timeout: std::time::Duration::from_secs(30),
            load_delay: std::time::Duration::from_millis(500),
            max_injection_retries: 3,
            injection_retry_delay: std::time::Duration::from_millis(500),
            wait_for_load: true,
            ping_timeout: std::time::Duration::from_secs(5),
        }
    }
}
