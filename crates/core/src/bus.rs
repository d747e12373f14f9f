// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic in-process listener registry shared by [`crate::tracker::ProgressTracker`]
//! and [`crate::log::LogCollector`].
//!
//! Listeners are plain boxed closures, not an `EventBus` trait object hierarchy:
//! there is no cross-session delivery here, only same-task fan-out.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Token returned by [`Bus::subscribe`]. Dropping it does not unsubscribe;
/// call [`Unsubscribe::remove`] (or let `Bus::clear` drop everything at once).
pub struct Unsubscribe<E> {
    id: u64,
    bus: Arc<Inner<E>>,
}

impl<E> Unsubscribe<E> {
    pub fn remove(self) {
        self.bus.listeners.lock().retain(|(id, _, _)| *id != self.id);
    }
}

struct Inner<E> {
    listeners: Mutex<Vec<(u64, Option<String>, Listener<E>)>>,
    next_id: AtomicU64,
}

/// A typed, tag-filtered event bus. `tag` at emission time is the routing key;
/// a subscription with `tag: None` (the wildcard, `'*'`) receives every event.
pub struct Bus<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for Bus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> Default for Bus<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }
}

impl<E> Bus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a specific tag. Pass `None` to subscribe to every event ('*').
    pub fn subscribe(
        &self,
        tag: Option<String>,
        listener: impl Fn(&E) + Send + Sync + 'static,
    ) -> Unsubscribe<E> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .listeners
            .lock()
            .push((id, tag, Arc::new(listener)));
        Unsubscribe {
            id,
            bus: Arc::clone(&self.inner),
        }
    }

    /// Emit an event, invoking every listener whose tag matches (or is wildcard).
    /// A panicking listener is caught and logged; it never prevents other
    /// listeners from running or removes them from the registry.
    pub fn emit(&self, tag: &str, event: &E) {
        let matching: Vec<Listener<E>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .filter(|(_, t, _)| t.as_deref().is_none_or(|t| t == tag))
            .map(|(_, _, l)| Arc::clone(l))
            .collect();

        for listener in matching {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener(event);
            }));
            if result.is_err() {
                tracing::warn!(tag, "event listener panicked, continuing");
            }
        }
    }

    /// Remove every subscription.
    pub fn clear(&self) {
        self.inner.listeners.lock().clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
