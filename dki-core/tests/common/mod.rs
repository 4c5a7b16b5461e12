// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Common Test Utilities
//!
//! A connection manager wired to mocks, plus a recording handler.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dki_core::network::*;
use dki_core::{CallbackHandler, SharedHandler};

pub type MockManager = ConnectionManager<MockTransport, MockScheduler>;

/// Shared log of notifications seen by the handler.
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<Notification>>>);

impl Received {
    pub fn handler(&self) -> SharedHandler {
        let log = self.0.clone();
        Arc::new(CallbackHandler::new(move |n: Notification| log.lock().unwrap().push(n)))
    }

    pub fn all(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

pub struct Harness {
    pub conn: MockManager,
    pub transport: MockTransport,
    pub scheduler: MockScheduler,
    pub received: Received,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Self {
        let transport = MockTransport::new();
        let scheduler = MockScheduler::new();
        let received = Received::default();
        let conn = ConnectionManager::new(
            transport.clone(),
            scheduler.clone(),
            config,
            received.handler(),
        );
        Harness {
            conn,
            transport,
            scheduler,
            received,
        }
    }

    pub fn current(&self) -> ConnectionId {
        self.conn.connection_id().expect("no live connection")
    }

    pub fn emit(&mut self, kind: TransportEventKind) {
        let id = self.current();
        self.conn.handle_event(TransportEvent::new(id, kind));
    }

    pub fn open(&mut self) -> ConnectionId {
        let id = self.current();
        self.emit(TransportEventKind::Opened);
        id
    }

    pub fn close(&mut self) {
        self.emit(TransportEventKind::Closed);
    }

    pub fn frame(&mut self, raw: &str) {
        self.emit(TransportEventKind::Frame(raw.to_string()));
    }

    /// Fires the single armed timer, returning its delay.
    pub fn fire_pending(&mut self) -> Option<Duration> {
        let pending = self.scheduler.pending();
        assert!(pending.len() <= 1, "expected at most one armed timer: {:?}", pending);
        let (id, delay) = pending.first().copied()?;
        assert!(self.scheduler.fire(id));
        self.conn.handle_timer(id);
        Some(delay)
    }
}

pub fn ms(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|v| Duration::from_millis(*v)).collect()
}
