// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn wildcard_listener_receives_every_tag() {
    let bus: Bus<u32> = Bus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    bus.subscribe(None, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    bus.emit("a", &1);
    bus.emit("b", &2);
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[test]
fn tagged_listener_only_receives_matching_tag() {
    let bus: Bus<u32> = Bus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    bus.subscribe(Some("a".into()), move |v| s.lock().push(*v));
    bus.emit("a", &1);
    bus.emit("b", &2);
    assert_eq!(*seen.lock(), vec![1]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let bus: Bus<u32> = Bus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&count);
    let handle = bus.subscribe(None, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    bus.emit("a", &1);
    handle.remove();
    bus.emit("a", &2);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_listener_does_not_stop_others() {
    let bus: Bus<u32> = Bus::new();
    let count = Arc::new(AtomicUsize::new(0));
    bus.subscribe(None, |_| panic!("boom"));
    let c = Arc::clone(&count);
    bus.subscribe(None, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    bus.emit("a", &1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    // listener registry is untouched by the panic
    assert_eq!(bus.listener_count(), 2);
}

#[test]
fn clear_removes_all_listeners() {
    let bus: Bus<u32> = Bus::new();
    bus.subscribe(None, |_| {});
    bus.subscribe(Some("a".into()), |_| {});
    bus.clear();
    assert_eq!(bus.listener_count(), 0);
}
