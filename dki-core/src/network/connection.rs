// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Connection Manager
//!
//! Manages the notification socket lifecycle: heartbeat, reconnection with
//! exponential backoff, and teardown.

use tracing::{debug, info, warn};
use url::Url;

use super::error::NetworkError;
use super::message::OutboundFrame;
use super::router::MessageRouter;
use super::timer::{Scheduler, TimerId};
use super::transport::{
    ConnectionId, ConnectionState, Transport, TransportConfig, TransportEvent, TransportEventKind,
    TransportResult,
};
use crate::events::SharedHandler;

/// One transport socket. Never reused across attempts.
#[derive(Debug)]
struct ConnectionHandle {
    id: ConnectionId,
    state: ConnectionState,
    heartbeat: Option<TimerId>,
}

/// Connection manager with heartbeat and automatic reconnection.
///
/// A sans-IO state machine: it issues commands to a [`Transport`] and a
/// [`Scheduler`], and is driven by feeding it transport events and timer
/// expirations. One manager lives for one signed-in session.
///
/// # Example
///
/// ```ignore
/// use dki_core::network::{ConnectionManager, MockScheduler, MockTransport, TransportConfig};
///
/// let mut conn = ConnectionManager::new(
///     MockTransport::new(),
///     MockScheduler::new(),
///     TransportConfig::default(),
///     handler,
/// );
/// conn.connect("session-token")?;
/// conn.handle_event(TransportEvent::new(id, TransportEventKind::Opened));
/// ```
pub struct ConnectionManager<T: Transport, S: Scheduler> {
    transport: T,
    scheduler: S,
    config: TransportConfig,
    router: MessageRouter,
    endpoint: Option<Url>,
    handle: Option<ConnectionHandle>,
    state: ConnectionState,
    reconnect_attempt: u32,
    reconnect_timer: Option<TimerId>,
    session_active: bool,
}

impl<T: Transport, S: Scheduler> ConnectionManager<T, S> {
    /// Creates a new, idle connection manager.
    pub fn new(transport: T, scheduler: S, config: TransportConfig, handler: SharedHandler) -> Self {
        ConnectionManager {
            transport,
            scheduler,
            config,
            router: MessageRouter::new(handler),
            endpoint: None,
            handle: None,
            state: ConnectionState::Idle,
            reconnect_attempt: 0,
            reconnect_timer: None,
            session_active: false,
        }
    }

    /// Starts connecting with the given session token.
    ///
    /// Returns once the attempt is started; the outcome arrives later as
    /// transport events. A transport that refuses to even start the attempt
    /// is handled like a closed connection.
    pub fn connect(&mut self, token: &str) -> TransportResult<()> {
        if token.trim().is_empty() {
            return Err(NetworkError::MissingToken);
        }
        if self.state.is_live() {
            return Err(NetworkError::AlreadyConnected);
        }

        let endpoint = self.config.endpoint(token)?;
        self.endpoint = Some(endpoint);
        self.session_active = true;

        if let Some(timer) = self.reconnect_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.open_handle();
        Ok(())
    }

    /// Tears everything down. Idempotent.
    ///
    /// Cancels the pending reconnect and the heartbeat and closes the
    /// socket. Events arriving afterwards are ignored.
    pub fn disconnect(&mut self) {
        self.session_active = false;

        if let Some(timer) = self.reconnect_timer.take() {
            self.scheduler.cancel(timer);
        }

        if let Some(mut handle) = self.handle.take() {
            if let Some(timer) = handle.heartbeat.take() {
                self.scheduler.cancel(timer);
            }
            self.state = ConnectionState::Closing;
            self.transport.close(handle.id);
            info!(connection = %handle.id, "notification socket disconnected");
        }

        self.state = ConnectionState::Closed;
    }

    /// Feeds one transport event into the state machine.
    pub fn handle_event(&mut self, event: TransportEvent) {
        let TransportEvent { connection, kind } = event;

        if !self.is_current(connection) {
            debug!(%connection, ?kind, "ignoring event for superseded connection");
            return;
        }

        match kind {
            TransportEventKind::Opened => self.on_open(connection),
            TransportEventKind::Frame(raw) => {
                self.router.route(&raw);
            }
            TransportEventKind::Error(error) => {
                warn!(%connection, %error, "notification socket error");
            }
            TransportEventKind::Closed => self.on_closed(connection),
        }
    }

    /// Handles an expired timer. Unknown IDs are ignored.
    pub fn handle_timer(&mut self, timer: TimerId) {
        if self.reconnect_timer == Some(timer) {
            self.reconnect_timer = None;
            if self.session_active {
                self.open_handle();
            }
            return;
        }

        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if handle.heartbeat != Some(timer) {
            return;
        }
        handle.heartbeat = None;
        if handle.state != ConnectionState::Open {
            return;
        }

        let id = handle.id;
        match OutboundFrame::Ping.to_json() {
            Ok(ping) => {
                if let Err(error) = self.transport.send(id, &ping) {
                    warn!(connection = %id, %error, "heartbeat send failed");
                }
            }
            Err(error) => warn!(%error, "failed to encode heartbeat"),
        }
        handle.heartbeat = Some(self.scheduler.schedule(self.config.heartbeat_interval()));
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true if the socket is open.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Returns the current reconnect attempt count.
    pub fn reconnect_attempt(&self) -> u32 {
        self.reconnect_attempt
    }

    /// Returns true between `connect` and `disconnect`.
    pub fn is_session_active(&self) -> bool {
        self.session_active
    }

    /// ID of the live connection handle, if any.
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.handle.as_ref().map(|h| h.id)
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Returns a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a mutable reference to the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns a reference to the underlying scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn is_current(&self, connection: ConnectionId) -> bool {
        self.handle.as_ref().is_some_and(|h| h.id == connection)
    }

    fn open_handle(&mut self) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };

        let id = ConnectionId::next();
        self.handle = Some(ConnectionHandle {
            id,
            state: ConnectionState::Connecting,
            heartbeat: None,
        });
        self.state = ConnectionState::Connecting;
        debug!(connection = %id, attempt = self.reconnect_attempt, "opening notification socket");

        if let Err(error) = self.transport.open(id, &endpoint) {
            warn!(connection = %id, %error, "failed to start connection");
            self.on_closed(id);
        }
    }

    fn on_open(&mut self, id: ConnectionId) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if handle.state != ConnectionState::Connecting {
            return;
        }

        handle.state = ConnectionState::Open;
        handle.heartbeat = Some(self.scheduler.schedule(self.config.heartbeat_interval()));
        self.state = ConnectionState::Open;
        self.reconnect_attempt = 0;
        info!(connection = %id, "notification socket connected");
    }

    fn on_closed(&mut self, id: ConnectionId) {
        if let Some(mut handle) = self.handle.take() {
            if let Some(timer) = handle.heartbeat.take() {
                self.scheduler.cancel(timer);
            }
        }
        self.state = ConnectionState::Closed;
        info!(connection = %id, "notification socket closed");

        if !self.session_active {
            return;
        }
        if self.reconnect_attempt >= self.config.max_reconnect_attempts {
            warn!(
                attempts = self.reconnect_attempt,
                "reconnect attempts exhausted; real-time notifications paused until next sign-in"
            );
            return;
        }

        let delay = self.config.reconnect_delay(self.reconnect_attempt);
        self.reconnect_attempt += 1;
        self.reconnect_timer = Some(self.scheduler.schedule(delay));
        info!(
            attempt = self.reconnect_attempt,
            ?delay,
            "scheduling reconnect"
        );
    }
}

impl<T: Transport, S: Scheduler> Drop for ConnectionManager<T, S> {
    fn drop(&mut self) {
        if self.handle.is_some() || self.reconnect_timer.is_some() {
            self.disconnect();
        }
    }
}

// INLINE_TEST_REQUIRED: Tests private handle and timer bookkeeping
#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::events::CallbackHandler;
    use crate::network::mock::{MockScheduler, MockTransport};

    fn create_manager() -> (
        ConnectionManager<MockTransport, MockScheduler>,
        MockTransport,
        MockScheduler,
    ) {
        let transport = MockTransport::new();
        let scheduler = MockScheduler::new();
        let handler = Arc::new(CallbackHandler::new(|_| {}));
        let conn = ConnectionManager::new(
            transport.clone(),
            scheduler.clone(),
            TransportConfig::default(),
            handler,
        );
        (conn, transport, scheduler)
    }

    fn open(conn: &mut ConnectionManager<MockTransport, MockScheduler>) -> ConnectionId {
        let id = conn.connection_id().unwrap();
        conn.handle_event(TransportEvent::new(id, TransportEventKind::Opened));
        id
    }

    #[test]
    fn test_open_arms_heartbeat() {
        let (mut conn, _, scheduler) = create_manager();
        conn.connect("token").unwrap();
        open(&mut conn);

        let heartbeat = conn.handle.as_ref().unwrap().heartbeat.unwrap();
        assert!(scheduler.is_pending(heartbeat));
        assert_eq!(scheduler.pending(), vec![(heartbeat, Duration::from_secs(30))]);
    }

    #[test]
    fn test_heartbeat_rearms_after_ping() {
        let (mut conn, transport, scheduler) = create_manager();
        conn.connect("token").unwrap();
        let id = open(&mut conn);

        let first = conn.handle.as_ref().unwrap().heartbeat.unwrap();
        assert!(scheduler.fire(first));
        conn.handle_timer(first);

        assert_eq!(transport.sent_frames(), vec![(id, r#"{"type":"ping"}"#.to_string())]);
        let second = conn.handle.as_ref().unwrap().heartbeat.unwrap();
        assert_ne!(first, second);
        assert!(scheduler.is_pending(second));
    }

    #[test]
    fn test_close_cancels_heartbeat() {
        let (mut conn, _, scheduler) = create_manager();
        conn.connect("token").unwrap();
        let id = open(&mut conn);
        let heartbeat = conn.handle.as_ref().unwrap().heartbeat.unwrap();

        conn.handle_event(TransportEvent::new(id, TransportEventKind::Closed));

        assert!(scheduler.is_cancelled(heartbeat));
        assert!(conn.handle.is_none());
        assert!(conn.reconnect_timer.is_some());
    }

    #[test]
    fn test_stale_reconnect_timer_ignored_after_disconnect() {
        let (mut conn, transport, _) = create_manager();
        conn.connect("token").unwrap();
        let id = conn.connection_id().unwrap();
        conn.handle_event(TransportEvent::new(id, TransportEventKind::Closed));
        let timer = conn.reconnect_timer.unwrap();

        conn.disconnect();
        conn.handle_timer(timer);

        assert_eq!(transport.opened().len(), 1);
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_reconnect_attempt_counter_bound() {
        let (mut conn, _, scheduler) = create_manager();
        conn.connect("token").unwrap();
        conn.reconnect_attempt = conn.config.max_reconnect_attempts;

        let id = conn.connection_id().unwrap();
        conn.handle_event(TransportEvent::new(id, TransportEventKind::Closed));

        assert!(conn.reconnect_timer.is_none());
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn test_drop_releases_timers() {
        let (mut conn, transport, scheduler) = create_manager();
        conn.connect("token").unwrap();
        let id = open(&mut conn);
        let heartbeat = conn.handle.as_ref().unwrap().heartbeat.unwrap();

        drop(conn);

        assert!(scheduler.is_cancelled(heartbeat));
        assert_eq!(transport.closed(), vec![id]);
    }
}
