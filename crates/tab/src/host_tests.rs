// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::controller::TabResponse;
use std::sync::atomic::{AtomicU32, Ordering};
use tro_core::SystemClock;

struct FlakyInjectTransport {
    fail_count: AtomicU32,
}

#[async_trait]
impl HostTransport for FlakyInjectTransport {
    async fn create_tab(&self, _url: &str) -> Result<TabId, TabError> {
        Ok(TabId::new("tab-1"))
    }

    async fn close_tab(&self, _tab_id: &TabId) -> Result<(), TabError> {
        Ok(())
    }

    async fn inject(&self, _tab_id: &TabId) -> Result<(), TabError> {
        if self.fail_count.load(Ordering::SeqCst) > 0 {
            self.fail_count.fetch_sub(1, Ordering::SeqCst);
            Err(TabError::Transport("injection script missing".into()))
        } else {
            Ok(())
        }
    }

    async fn request(&self, _tab_id: &TabId, _command: &TabCommand) -> Result<TabResponse, TabError> {
        Ok(TabResponse::Ping { ready: true })
    }
}

#[tokio::test(start_paused = true)]
async fn s5_injection_retries_then_succeeds() {
    let transport = FlakyInjectTransport {
        fail_count: AtomicU32::new(2),
    };
    let controller = HostTabController::new(transport, SystemClock, TabConfig::default());
    let info = controller.open_tab("https://example.com").await.unwrap();
    assert!(info.script_injected);
}

struct AlwaysFailInjectTransport;

#[async_trait]
impl HostTransport for AlwaysFailInjectTransport {
    async fn create_tab(&self, _url: &str) -> Result<TabId, TabError> {
        Ok(TabId::new("tab-1"))
    }
    async fn close_tab(&self, _tab_id: &TabId) -> Result<(), TabError> {
        Ok(())
    }
    async fn inject(&self, _tab_id: &TabId) -> Result<(), TabError> {
        Err(TabError::Transport("nope".into()))
    }
    async fn request(&self, _tab_id: &TabId, _command: &TabCommand) -> Result<TabResponse, TabError> {
        Ok(TabResponse::Ping { ready: false })
    }
}

#[tokio::test(start_paused = true)]
async fn injection_exhaustion_surfaces_as_error() {
    let controller = HostTabController::new(AlwaysFailInjectTransport, SystemClock, TabConfig::default());
    let result = controller.open_tab("https://example.com").await;
    assert!(matches!(result, Err(TabError::InjectionExhausted { attempts: 3, .. })));
}

struct SlowTransport;

#[async_trait]
impl HostTransport for SlowTransport {
    async fn create_tab(&self, _url: &str) -> Result<TabId, TabError> {
        Ok(TabId::new("tab-1"))
    }
    async fn close_tab(&self, _tab_id: &TabId) -> Result<(), TabError> {
        Ok(())
    }
    async fn inject(&self, _tab_id: &TabId) -> Result<(), TabError> {
        Ok(())
    }
    async fn request(&self, _tab_id: &TabId, _command: &TabCommand) -> Result<TabResponse, TabError> {
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        Ok(TabResponse::Ok { ok: true, error: None })
    }
}

#[tokio::test(start_paused = true)]
async fn send_message_times_out() {
    let controller = HostTabController::new(
        SlowTransport,
        SystemClock,
        TabConfig {
            timeout: std::time::Duration::from_millis(10),
            ..TabConfig::default()
        },
    );
    let tab_id = TabId::new("tab-1");
    let result = controller.send_message(&tab_id, TabCommand::Ping).await;
    assert!(matches!(result, Err(TabError::Timeout(_))));
}
