// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-session event queue with long-poll retrieval.

use parking_lot::Mutex;
use relay_core::{DebugEvent, EventType};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;

const DEFAULT_MAX_SIZE: usize = 1000;
const DEFAULT_MAX_HISTORY: usize = 100;

struct QueueState {
    queue: VecDeque<DebugEvent>,
    history: VecDeque<DebugEvent>,
    total: u64,
}

/// Bounded FIFO of debug events plus a short history ring.
///
/// `put` is synchronous and never blocks the adapter reader: on overflow the
/// oldest event is dropped before the new one is inserted.
pub struct EventQueue {
    inner: Mutex<QueueState>,
    notify: Notify,
    max_size: usize,
    max_history: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SIZE, DEFAULT_MAX_HISTORY)
    }

    pub fn with_capacity(max_size: usize, max_history: usize) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                queue: VecDeque::new(),
                history: VecDeque::new(),
                total: 0,
            }),
            notify: Notify::new(),
            max_size,
            max_history,
        }
    }

    /// Enqueue an event, dropping the oldest on overflow.
    pub fn put(&self, event_type: EventType, data: serde_json::Value) {
        let event = DebugEvent::new(event_type, data);
        {
            let mut inner = self.inner.lock();
            if inner.queue.len() >= self.max_size {
                inner.queue.pop_front();
            }
            inner.queue.push_back(event.clone());

            inner.history.push_back(event);
            if inner.history.len() > self.max_history {
                inner.history.pop_front();
            }
            inner.total += 1;
        }
        self.notify.notify_one();
    }

    /// Drain all queued events. When the queue is empty and a timeout is
    /// given, long-poll up to that long for the first event, then drain any
    /// that arrived with it.
    pub async fn get_all(&self, timeout: Option<Duration>) -> Vec<DebugEvent> {
        let drained = self.drain();
        if !drained.is_empty() {
            return drained;
        }

        let Some(timeout) = timeout.filter(|t| !t.is_zero()) else {
            return drained;
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before re-checking so a concurrent put
            // cannot slip between the check and the wait.
            let notified = self.notify.notified();
            let drained = self.drain();
            if !drained.is_empty() {
                return drained;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.drain();
            }
        }
    }

    fn drain(&self) -> Vec<DebugEvent> {
        self.inner.lock().queue.drain(..).collect()
    }

    /// Drop queued events and history; the total counter resets too.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.queue.clear();
        inner.history.clear();
        inner.total = 0;
    }

    /// Events currently waiting in the queue.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Total events ever enqueued.
    pub fn total_events(&self) -> u64 {
        self.inner.lock().total
    }

    /// Recent event history (read-only copy).
    pub fn history(&self) -> Vec<DebugEvent> {
        self.inner.lock().history.iter().cloned().collect()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
