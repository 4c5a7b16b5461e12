// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Notification Client
//!
//! Runs the session gate, connection manager and router on a single tokio
//! task. Commands, socket events and timer expirations all funnel into one
//! `select!` loop, so connection state is only ever touched from one place.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::events::SharedHandler;
use crate::network::{
    ConnectionManager, ConnectionState, TokioScheduler, TransportConfig, WebSocketTransport,
};
use crate::session::{ManagerFactory, SessionGate, SessionState, SessionStore};

enum Command {
    SignIn(String),
    SignOut,
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running notification client.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) still
/// tears the connection down, just without waiting for it.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use dki_core::{ChannelHandler, NotificationClient, TransportConfig};
///
/// let (handler, mut notifications) = ChannelHandler::new();
/// let client = NotificationClient::spawn(TransportConfig::default(), Arc::new(handler));
/// client.sign_in(token);
///
/// while let Some(n) = notifications.recv().await {
///     println!("{}", n.title());
/// }
/// ```
pub struct NotificationClient {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl NotificationClient {
    /// Spawns the client task on the current tokio runtime. Starts signed out.
    pub fn spawn(config: TransportConfig, handler: SharedHandler) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ConnectionState::Idle);

        let task = tokio::spawn(run_client(
            config,
            handler,
            commands_rx,
            state_tx,
        ));

        NotificationClient {
            commands,
            state,
            task,
        }
    }

    /// Signs in and starts connecting.
    ///
    /// Transitions are applied in call order, so `sign_out` followed by
    /// `sign_in` always replaces the connection. Signing in while already
    /// signed in is a no-op.
    pub fn sign_in(&self, token: impl Into<String>) {
        self.send(Command::SignIn(token.into()));
    }

    /// Signs out and tears the connection down.
    pub fn sign_out(&self) {
        self.send(Command::SignOut);
    }

    /// Latest connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns true while the socket is open.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Open
    }

    /// Watches connection state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Tears down the connection and waits for the client task to exit.
    pub async fn shutdown(self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
        let _ = self.task.await;
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("notification client already stopped");
        }
    }
}

async fn run_client(
    config: TransportConfig,
    handler: SharedHandler,
    mut commands: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
) {
    let (transport_tx, mut transport_rx) = mpsc::unbounded_channel();
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();

    let factory: ManagerFactory<WebSocketTransport, TokioScheduler> = Box::new(move || {
        ConnectionManager::new(
            WebSocketTransport::new(transport_tx.clone()),
            TokioScheduler::new(timer_tx.clone()),
            config.clone(),
            handler.clone(),
        )
    });
    let session = SessionStore::new();
    let mut gate = SessionGate::new(session.clone(), factory);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::SignIn(token)) => {
                    if gate.state() == SessionState::SignedOut {
                        session.sign_in(token);
                        gate.refresh();
                    }
                }
                Some(Command::SignOut) => {
                    session.sign_out();
                    gate.refresh();
                }
                Some(Command::Shutdown(done)) => {
                    gate.teardown();
                    state_tx.send_replace(gate.connection_state());
                    let _ = done.send(());
                    break;
                }
                None => {
                    gate.teardown();
                    break;
                }
            },
            Some(event) = transport_rx.recv() => gate.handle_event(event),
            Some(timer) = timer_rx.recv() => gate.handle_timer(timer),
        }

        let current = gate.connection_state();
        state_tx.send_if_modified(|state| {
            if *state == current {
                return false;
            }
            *state = current;
            true
        });
    }

    debug!("notification client stopped");
}
