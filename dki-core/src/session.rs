// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Session Gate
//!
//! Binds the notification connection to the authentication state. A fresh
//! connection manager is built on every sign-in and torn down on sign-out,
//! so nothing (attempt counters, timers, sockets) leaks between sessions.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::network::{
    ConnectionManager, ConnectionState, Scheduler, TimerId, Transport, TransportEvent,
};

/// Source of authentication state.
pub trait SessionProvider: Send + Sync {
    /// Whether a user is signed in.
    fn is_authenticated(&self) -> bool;

    /// Current session token, if any.
    fn token(&self) -> Option<String>;
}

/// Shared in-memory session.
///
/// Clones share the same token.
#[derive(Clone, Default)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionStore {
    /// Creates a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a session token.
    pub fn sign_in(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    /// Forgets the session token.
    pub fn sign_out(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl SessionProvider for SessionStore {
    fn is_authenticated(&self) -> bool {
        self.token()
            .is_some_and(|token| !token.trim().is_empty())
    }

    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Authentication state as seen by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn,
}

/// Builds one connection manager per signed-in session.
pub type ManagerFactory<T, S> = Box<dyn FnMut() -> ConnectionManager<T, S> + Send>;

/// Two-state machine connecting on sign-in and disconnecting on sign-out.
///
/// Starts `SignedOut` and never terminates; it oscillates for the lifetime
/// of the application.
pub struct SessionGate<T: Transport, S: Scheduler, P: SessionProvider> {
    provider: P,
    factory: ManagerFactory<T, S>,
    state: SessionState,
    manager: Option<ConnectionManager<T, S>>,
    detached_state: ConnectionState,
}

impl<T: Transport, S: Scheduler, P: SessionProvider> SessionGate<T, S, P> {
    /// Creates a signed-out gate.
    pub fn new(provider: P, factory: ManagerFactory<T, S>) -> Self {
        SessionGate {
            provider,
            factory,
            state: SessionState::SignedOut,
            manager: None,
            detached_state: ConnectionState::Idle,
        }
    }

    /// Re-reads the provider and applies any transition.
    pub fn refresh(&mut self) {
        let authenticated = self.provider.is_authenticated();
        self.set_authenticated(authenticated);
    }

    /// Applies an authentication change. Same-state calls are no-ops.
    pub fn set_authenticated(&mut self, authenticated: bool) {
        match (self.state, authenticated) {
            (SessionState::SignedOut, true) => self.enter_signed_in(),
            (SessionState::SignedIn, false) => self.enter_signed_out(),
            _ => {}
        }
    }

    /// Releases the socket and timers, e.g. on application shutdown.
    pub fn teardown(&mut self) {
        if self.state == SessionState::SignedIn {
            self.enter_signed_out();
        }
    }

    /// Forwards a transport event to the current manager.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match self.manager.as_mut() {
            Some(manager) => manager.handle_event(event),
            None => debug!(connection = %event.connection, "dropping event while signed out"),
        }
    }

    /// Forwards a timer expiration to the current manager.
    pub fn handle_timer(&mut self, timer: TimerId) {
        if let Some(manager) = self.manager.as_mut() {
            manager.handle_timer(timer);
        }
    }

    /// Returns the session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Connection state of the current manager, or the last known one.
    pub fn connection_state(&self) -> ConnectionState {
        self.manager
            .as_ref()
            .map(|m| m.state())
            .unwrap_or(self.detached_state)
    }

    /// The manager of the current session.
    pub fn manager(&self) -> Option<&ConnectionManager<T, S>> {
        self.manager.as_ref()
    }

    /// Returns the session provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn enter_signed_in(&mut self) {
        self.state = SessionState::SignedIn;
        let mut manager = (self.factory)();

        match self.provider.token() {
            Some(token) => {
                if let Err(error) = manager.connect(&token) {
                    warn!(%error, "could not start notification connection");
                }
            }
            None => warn!("signed in without a session token"),
        }

        info!("session started");
        self.manager = Some(manager);
    }

    fn enter_signed_out(&mut self) {
        if let Some(mut manager) = self.manager.take() {
            manager.disconnect();
            self.detached_state = manager.state();
        }
        self.state = SessionState::SignedOut;
        info!("session ended");
    }
}
