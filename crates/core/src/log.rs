// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, leveled, filterable log buffer with a single-string rendering.

use crate::bus::{Bus, Unsubscribe};
use crate::clock::Clock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub epoch_ms: u64,
    pub formatted_time: String,
    pub level: LogLevel,
    pub message: String,
    pub step_index: Option<usize>,
    pub row_index: Option<usize>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub max_logs: usize,
    pub include_debug: bool,
    pub include_timestamp: bool,
    pub include_level: bool,
    pub line_separator: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            max_logs: 10_000,
            include_debug: false,
            include_timestamp: true,
            include_level: true,
            line_separator: "\n".to_string(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LogFilter {
    pub levels: Option<Vec<LogLevel>>,
    pub step_index: Option<usize>,
    pub row_index: Option<usize>,
    pub after_ms: Option<u64>,
    pub before_ms: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogStats {
    pub total: usize,
    pub debug: usize,
    pub info: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
    pub first_log_at: Option<u64>,
    pub last_log_at: Option<u64>,
    pub duration_ms: Option<u64>,
}

/// Events emitted after each append.
#[derive(Debug, Clone)]
pub struct LogAppended(pub LogEntry);

pub struct LogCollector<C: Clock> {
    clock: C,
    config: LogConfig,
    entries: parking_lot::Mutex<Vec<LogEntry>>,
    bus: Bus<LogAppended>,
}

impl<C: Clock> LogCollector<C> {
    pub fn new(clock: C, config: LogConfig) -> Self {
        Self {
            clock,
            config,
            entries: parking_lot::Mutex::new(Vec::new()),
            bus: Bus::new(),
        }
    }

    pub fn on_log(
        &self,
        listener: impl Fn(&LogAppended) + Send + Sync + 'static,
    ) -> Unsubscribe<LogAppended> {
        self.bus.subscribe(None, listener)
    }

    pub fn log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        step_index: Option<usize>,
        row_index: Option<usize>,
        context: Option<String>,
    ) {
        if level == LogLevel::Debug && !self.config.include_debug {
            return;
        }
        let epoch_ms = self.clock.epoch_ms();
        let entry = LogEntry {
            epoch_ms,
            formatted_time: format_hms(epoch_ms),
            level,
            message: message.into(),
            step_index,
            row_index,
            context,
        };
        {
            let mut entries = self.entries.lock();
            entries.push(entry.clone());
            if self.config.max_logs > 0 && entries.len() > self.config.max_logs {
                let excess = entries.len() - self.config.max_logs;
                entries.drain(0..excess);
            }
        }
        self.bus.emit("log", &LogAppended(entry));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message, None, None, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message, None, None, None);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message, None, None, None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message, None, None, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message, None, None, None);
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn filtered(&self, filter: &LogFilter) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| {
                filter
                    .levels
                    .as_ref()
                    .is_none_or(|levels| levels.contains(&e.level))
                    && filter.step_index.is_none_or(|i| e.step_index == Some(i))
                    && filter.row_index.is_none_or(|i| e.row_index == Some(i))
                    && filter.after_ms.is_none_or(|t| e.epoch_ms >= t)
                    && filter.before_ms.is_none_or(|t| e.epoch_ms <= t)
                    && filter
                        .search
                        .as_ref()
                        .is_none_or(|q| e.message.to_lowercase().contains(&q.to_lowercase()))
            })
            .cloned()
            .collect()
    }

    /// Render the full buffer as a single newline-separated string. This is
    /// the only path that may be persisted as the run's `logs` field.
    pub fn render(&self) -> String {
        self.entries
            .lock()
            .iter()
            .map(|e| self.render_line(e))
            .collect::<Vec<_>>()
            .join(&self.config.line_separator)
    }

    fn render_line(&self, e: &LogEntry) -> String {
        let mut parts = Vec::new();
        if self.config.include_timestamp {
            parts.push(format!("[{}]", e.formatted_time));
        }
        if self.config.include_level {
            parts.push(format!("[{}]", e.level.label()));
        }
        parts.push(e.message.clone());
        parts.join(" ")
    }

    pub fn stats(&self) -> LogStats {
        let entries = self.entries.lock();
        let mut stats = LogStats {
            total: entries.len(),
            ..Default::default()
        };
        for e in entries.iter() {
            match e.level {
                LogLevel::Debug => stats.debug += 1,
                LogLevel::Info => stats.info += 1,
                LogLevel::Success => stats.success += 1,
                LogLevel::Warning => stats.warning += 1,
                LogLevel::Error => stats.error += 1,
            }
        }
        stats.first_log_at = entries.first().map(|e| e.epoch_ms);
        stats.last_log_at = entries.last().map(|e| e.epoch_ms);
        stats.duration_ms = match (stats.first_log_at, stats.last_log_at) {
            (Some(a), Some(b)) => Some(b.saturating_sub(a)),
            _ => None,
        };
        stats
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn format_hms(epoch_ms: u64) -> String {
    let secs = epoch_ms / 1000;
    let h = (secs / 3600) % 24;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
