// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration for the orchestrator, composed from one struct per subsystem.

use tro_core::{LogConfig, ProgressConfig, ResultConfig};
use tro_tab::TabConfig;

/// Root configuration, composed of one config struct per subsystem. Each
/// field is independently `Default`-implementing; use the `with_*` builders
/// to override a subset.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub tab: TabConfig,
    pub progress: ProgressConfig,
    pub logs: LogConfig,
    pub results: ResultConfig,
}

impl OrchestratorConfig {
    pub fn with_tab(mut self, tab: TabConfig) -> Self {
        self.tab = tab;
        self
    }

    pub fn with_progress(mut self, progress: ProgressConfig) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logs(mut self, logs: LogConfig) -> Self {
        self.logs = logs;
        self
    }

    pub fn with_results(mut self, results: ResultConfig) -> Self {
        self.results = results;
        self
    }
}
