// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real `TabController` backed by an external host transport (e.g. a native
//! messaging host talking to the browser extension).

use crate::controller::{TabCommand, TabConfig, TabController, TabError, TabInfo, TabResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tro_core::{Clock, TabId};

/// Raw channel to the browser host process. A `HostTabController` wraps this
/// with retry, timeout, and tab bookkeeping; implementations only need to
/// shuttle one request/response pair.
#[async_trait]
pub trait HostTransport: Send + Sync + 'static {
    async fn create_tab(&self, url: &str) -> Result<TabId, TabError>;
    async fn close_tab(&self, tab_id: &TabId) -> Result<(), TabError>;
    async fn inject(&self, tab_id: &TabId) -> Result<(), TabError>;
    async fn request(&self, tab_id: &TabId, command: &TabCommand) -> Result<TabResponse, TabError>;
}

pub struct HostTabController<T, C: Clock> {
    transport: Arc<T>,
    clock: C,
    config: TabConfig,
    tabs: Mutex<HashMap<TabId, TabInfo>>,
}

impl<T: HostTransport, C: Clock> HostTabController<T, C> {
    pub fn new(transport: T, clock: C, config: TabConfig) -> Self {
        Self {
            transport: Arc::new(transport),
            clock,
            config,
            tabs: Mutex::new(HashMap::new()),
        }
    }

    async fn inject_with_retry(&self, tab_id: &TabId) -> Result<(), TabError> {
        let mut last_error = String::new();
        for attempt in 1..=self.config.max_injection_retries {
            match self.transport.inject(tab_id).await {
                Ok(()) => {
                    if let Some(tab) = self.tabs.lock().get_mut(tab_id) {
                        tab.script_injected = true;
                    }
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(%tab_id, attempt, error = %e, "injection attempt failed");
                    last_error = e.to_string();
                    if attempt < self.config.max_injection_retries {
                        tokio::time::sleep(self.config.injection_retry_delay).await;
                    }
                }
            }
        }
        Err(TabError::InjectionExhausted {
            attempts: self.config.max_injection_retries,
            last_error,
        })
    }
}

#[async_trait]
impl<T: HostTransport, C: Clock> TabController for HostTabController<T, C> {
    async fn open_tab(&self, url: &str) -> Result<TabInfo, TabError> {
        let tab_id = self.transport.create_tab(url).await?;
        if self.config.wait_for_load {
            tokio::time::sleep(self.config.load_delay).await;
        }
        let info = TabInfo {
            tab_id: tab_id.clone(),
            url: url.to_string(),
            script_injected: false,
            created_at_ms: self.clock.epoch_ms(),
        };
        self.tabs.lock().insert(tab_id.clone(), info.clone());
        self.inject_with_retry(&tab_id).await?;
        Ok(self.tabs.lock().get(&tab_id).cloned().unwrap_or(info))
    }

    async fn close_tab(&self, tab_id: &TabId) -> bool {
        let result = self.transport.close_tab(tab_id).await;
        self.tabs.lock().remove(tab_id);
        result.is_ok()
    }

    async fn inject_script(&self, tab_id: &TabId) -> Result<(), TabError> {
        self.inject_with_retry(tab_id).await
    }

    async fn is_tab_ready(&self, tab_id: &TabId) -> bool {
        let request = self.transport.request(tab_id, &TabCommand::Ping);
        match tokio::time::timeout(self.config.ping_timeout, request).await {
            Ok(Ok(response)) => response.is_ready(),
            _ => false,
        }
    }

    async fn get_tab_info(&self, tab_id: &TabId) -> Option<TabInfo> {
        self.tabs.lock().get(tab_id).cloned()
    }

    async fn send_message(
        &self,
        tab_id: &TabId,
        command: TabCommand,
    ) -> Result<TabResponse, TabError> {
        let request = self.transport.request(tab_id, &command);
        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TabError::Timeout(self.config.timeout)),
        }
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
