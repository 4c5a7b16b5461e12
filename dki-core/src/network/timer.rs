// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Timers
//!
//! One-shot timers for heartbeats and reconnect backoff. A timer that fires
//! is reported back to the owner by ID; the owner decides whether the ID is
//! still current.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique timer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocates the next ID.
    pub fn next() -> Self {
        TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Schedules one-shot timers.
pub trait Scheduler: Send {
    /// Arms a timer that fires once after `after`.
    fn schedule(&mut self, after: Duration) -> TimerId;

    /// Disarms a timer. Unknown or already fired IDs are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Tokio-backed scheduler.
///
/// Each timer is a sleeping task that sends its ID into `fired` when it
/// expires. Cancelling aborts the task. Dropping the scheduler aborts every
/// pending timer.
pub struct TokioScheduler {
    fired: mpsc::UnboundedSender<TimerId>,
    pending: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Creates a scheduler reporting expirations to `fired`.
    pub fn new(fired: mpsc::UnboundedSender<TimerId>) -> Self {
        TokioScheduler {
            fired,
            pending: HashMap::new(),
        }
    }

    /// Number of timers not yet fired or cancelled.
    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|h| !h.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, after: Duration) -> TimerId {
        self.pending.retain(|_, handle| !handle.is_finished());

        let id = TimerId::next();
        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = fired.send(id);
        });
        self.pending.insert(id, handle);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.pending.remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
