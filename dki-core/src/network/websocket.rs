// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real transport implementation using tokio-tungstenite. Each connection
//! runs in its own task and reports back through the event channel.
//! Supports both native-tls and rustls TLS backends for `wss://`.

use std::collections::HashMap;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::debug;
use url::Url;

use super::error::NetworkError;
use super::transport::{
    ConnectionId, Transport, TransportEvent, TransportEventKind, TransportResult,
};

struct Socket {
    outbound: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

/// WebSocket transport for the notification endpoint.
///
/// Supports both ws:// (plaintext) and wss:// (TLS) connections. Must be
/// used from within a tokio runtime.
///
/// # Example
///
/// ```ignore
/// use dki_core::network::{WebSocketTransport, Transport, ConnectionId};
///
/// let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
/// let mut transport = WebSocketTransport::new(events_tx);
/// transport.open(ConnectionId::next(), &endpoint)?;
/// while let Some(event) = events_rx.recv().await { /* ... */ }
/// ```
pub struct WebSocketTransport {
    events: mpsc::UnboundedSender<TransportEvent>,
    sockets: HashMap<ConnectionId, Socket>,
}

impl WebSocketTransport {
    /// Creates a transport reporting to `events`.
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        WebSocketTransport {
            events,
            sockets: HashMap::new(),
        }
    }

    /// Number of sockets still running.
    pub fn active_sockets(&self) -> usize {
        self.sockets.values().filter(|s| !s.task.is_finished()).count()
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self, connection: ConnectionId, endpoint: &Url) -> TransportResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| NetworkError::ConnectionFailed(format!("no async runtime: {}", e)))?;

        self.sockets.retain(|_, socket| !socket.task.is_finished());

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_socket(
            connection,
            endpoint.clone(),
            outbound_rx,
            self.events.clone(),
        ));
        self.sockets.insert(connection, Socket { outbound, task });
        Ok(())
    }

    fn send(&mut self, connection: ConnectionId, frame: &str) -> TransportResult<()> {
        let socket = self
            .sockets
            .get(&connection)
            .ok_or(NetworkError::NotConnected)?;

        socket
            .outbound
            .send(Message::Text(frame.to_string()))
            .map_err(|_| NetworkError::ConnectionClosed)
    }

    fn close(&mut self, connection: ConnectionId) {
        // Dropping the sender makes the socket task send a close frame and exit.
        self.sockets.remove(&connection);
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        // Sockets passed to `close` are no longer here and finish on their own.
        for (_, socket) in self.sockets.drain() {
            socket.task.abort();
        }
    }
}

async fn run_socket(
    connection: ConnectionId,
    endpoint: Url,
    mut outbound: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events.send(TransportEvent::new(connection, kind));
    };

    let stream = tokio::select! {
        result = connect_async(endpoint.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                emit(TransportEventKind::Error(NetworkError::ConnectionFailed(e.to_string())));
                emit(TransportEventKind::Closed);
                return;
            }
        },
        _ = close_requested(&mut outbound) => {
            emit(TransportEventKind::Closed);
            return;
        }
    };

    emit(TransportEventKind::Opened);
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    if let Err(e) = sink.send(message).await {
                        emit(TransportEventKind::Error(NetworkError::SendFailed(e.to_string())));
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(TransportEventKind::Frame(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => emit(TransportEventKind::Frame(text)),
                    Err(_) => debug!(%connection, "dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(%connection, ?frame, "server closed socket");
                    break;
                }
                // Ping/pong control frames are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(TransportEventKind::Error(NetworkError::ReceiveFailed(e.to_string())));
                    break;
                }
                None => break,
            },
        }
    }

    emit(TransportEventKind::Closed);
}

/// Resolves once every sender for `outbound` is gone.
async fn close_requested(outbound: &mut mpsc::UnboundedReceiver<Message>) {
    while outbound.recv().await.is_some() {}
}
