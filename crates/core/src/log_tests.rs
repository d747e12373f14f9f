// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn collector() -> (LogCollector<FakeClock>, FakeClock) {
    let clock = FakeClock::new();
    (LogCollector::new(clock.clone(), LogConfig::default()), clock)
}

#[test]
fn render_round_trips_line_count_and_content() {
    let (log, _clock) = collector();
    log.info("first");
    log.error("second");
    let rendered = log.render();
    let lines: Vec<_> = rendered.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("first") && lines[0].contains("INFO"));
    assert!(lines[1].contains("second") && lines[1].contains("ERROR"));
}

#[test]
fn render_omits_level_and_timestamp_when_disabled() {
    let clock = FakeClock::new();
    let config = LogConfig {
        include_timestamp: false,
        include_level: false,
        ..LogConfig::default()
    };
    let log = LogCollector::new(clock, config);
    log.info("bare message");
    assert_eq!(log.render(), "bare message");
}

#[test]
fn debug_suppressed_unless_enabled() {
    let (log, _clock) = collector();
    log.debug("hidden");
    assert_eq!(log.entries().len(), 0);

    let clock = FakeClock::new();
    let log2 = LogCollector::new(
        clock,
        LogConfig {
            include_debug: true,
            ..LogConfig::default()
        },
    );
    log2.debug("visible");
    assert_eq!(log2.entries().len(), 1);
}

#[test]
fn capacity_drops_oldest_tail_preserving() {
    let clock = FakeClock::new();
    let log = LogCollector::new(
        clock,
        LogConfig {
            max_logs: 3,
            ..LogConfig::default()
        },
    );
    for i in 0..10 {
        log.info(format!("msg{i}"));
    }
    let entries = log.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].message, "msg7");
    assert_eq!(entries[2].message, "msg9");
}

#[test]
fn filter_by_level_and_step_index() {
    let (log, _clock) = collector();
    log.log(LogLevel::Info, "step0 info", Some(0), None, None);
    log.log(LogLevel::Success, "step0 success", Some(0), None, None);
    log.log(LogLevel::Error, "step1 timeout", Some(1), None, None);
    log.log(LogLevel::Warning, "step1 warn", Some(1), None, None);

    let filtered = log.filtered(&LogFilter {
        levels: Some(vec![LogLevel::Error, LogLevel::Warning]),
        step_index: Some(1),
        ..Default::default()
    });
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].message, "step1 timeout");
    assert_eq!(filtered[1].message, "step1 warn");
}

#[test]
fn filter_search_is_case_insensitive() {
    let (log, _clock) = collector();
    log.info("Timeout waiting for element");
    log.info("all good");
    let filtered = log.filtered(&LogFilter {
        search: Some("timeout".into()),
        ..Default::default()
    });
    assert_eq!(filtered.len(), 1);
}

#[test]
fn listener_panic_does_not_break_append_or_other_listeners() {
    let (log, _clock) = collector();
    log.on_log(|_| panic!("bad listener"));
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    log.on_log(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    log.info("hello");
    assert_eq!(log.entries().len(), 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn stats_counts_levels_and_duration() {
    let clock = FakeClock::new();
    let log = LogCollector::new(clock.clone(), LogConfig::default());
    log.info("a");
    clock.advance(std::time::Duration::from_secs(2));
    log.error("b");
    let stats = log.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.info, 1);
    assert_eq!(stats.error, 1);
    assert_eq!(stats.duration_ms, Some(2000));
}
