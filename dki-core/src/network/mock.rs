// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Transport and Scheduler
//!
//! In-memory stand-ins for tests. Both are cheap handles over shared state:
//! clone one, hand the clone to a connection manager, and inspect what the
//! manager did through the original.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use url::Url;

use super::error::NetworkError;
use super::timer::{Scheduler, TimerId};
use super::transport::{ConnectionId, Transport, TransportResult};

#[derive(Default)]
struct TransportLog {
    opened: Vec<(ConnectionId, Url)>,
    sent: Vec<(ConnectionId, String)>,
    closed: Vec<ConnectionId>,
    open_error: Option<NetworkError>,
    send_error: Option<NetworkError>,
}

/// Transport that records calls instead of touching the network.
///
/// Events are not generated automatically; tests feed `TransportEvent`s to
/// the manager for the IDs this transport recorded.
#[derive(Clone, Default)]
pub struct MockTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, TransportLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Makes the next `open` call fail with `error`.
    pub fn inject_open_error(&self, error: NetworkError) {
        self.log().open_error = Some(error);
    }

    /// Makes the next `send` call fail with `error`.
    pub fn inject_send_error(&self, error: NetworkError) {
        self.log().send_error = Some(error);
    }

    /// IDs passed to `open`, in call order.
    pub fn opened(&self) -> Vec<ConnectionId> {
        self.log().opened.iter().map(|(id, _)| *id).collect()
    }

    /// Most recently opened connection.
    pub fn last_opened(&self) -> Option<ConnectionId> {
        self.log().opened.last().map(|(id, _)| *id)
    }

    /// Endpoints passed to `open`, in call order.
    pub fn endpoints(&self) -> Vec<Url> {
        self.log().opened.iter().map(|(_, url)| url.clone()).collect()
    }

    /// Frames passed to `send`, in call order.
    pub fn sent_frames(&self) -> Vec<(ConnectionId, String)> {
        self.log().sent.clone()
    }

    /// IDs passed to `close`, in call order.
    pub fn closed(&self) -> Vec<ConnectionId> {
        self.log().closed.clone()
    }
}

impl Transport for MockTransport {
    fn open(&mut self, connection: ConnectionId, endpoint: &Url) -> TransportResult<()> {
        let mut log = self.log();
        log.opened.push((connection, endpoint.clone()));
        match log.open_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn send(&mut self, connection: ConnectionId, frame: &str) -> TransportResult<()> {
        let mut log = self.log();
        if let Some(error) = log.send_error.take() {
            return Err(error);
        }
        log.sent.push((connection, frame.to_string()));
        Ok(())
    }

    fn close(&mut self, connection: ConnectionId) {
        self.log().closed.push(connection);
    }
}

#[derive(Default)]
struct TimerLog {
    scheduled: Vec<(TimerId, Duration)>,
    cancelled: HashSet<TimerId>,
    fired: HashSet<TimerId>,
}

/// Scheduler with a manual clock: nothing fires until the test says so.
#[derive(Clone, Default)]
pub struct MockScheduler {
    log: Arc<Mutex<TimerLog>>,
}

impl MockScheduler {
    /// Creates a new mock scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    fn log(&self) -> MutexGuard<'_, TimerLog> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every timer ever scheduled, with its delay.
    pub fn scheduled(&self) -> Vec<(TimerId, Duration)> {
        self.log().scheduled.clone()
    }

    /// Timers neither cancelled nor fired.
    pub fn pending(&self) -> Vec<(TimerId, Duration)> {
        let log = self.log();
        log.scheduled
            .iter()
            .filter(|(id, _)| !log.cancelled.contains(id) && !log.fired.contains(id))
            .copied()
            .collect()
    }

    /// Returns true if `id` is still armed.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending().iter().any(|(pending, _)| *pending == id)
    }

    /// Returns true if `id` was cancelled.
    pub fn is_cancelled(&self, id: TimerId) -> bool {
        self.log().cancelled.contains(&id)
    }

    /// Marks a pending timer as fired.
    ///
    /// Returns false if the timer was cancelled or already fired, in which
    /// case a real scheduler would not have delivered it.
    pub fn fire(&self, id: TimerId) -> bool {
        let mut log = self.log();
        if log.cancelled.contains(&id) || log.fired.contains(&id) {
            return false;
        }
        log.fired.insert(id)
    }
}

impl Scheduler for MockScheduler {
    fn schedule(&mut self, after: Duration) -> TimerId {
        let id = TimerId::next();
        self.log().scheduled.push((id, after));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.log().cancelled.insert(id);
    }
}
