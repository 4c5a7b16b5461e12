//! Network + Transport Layer
//!
//! Real-time notification channel between the app and the backend.
//!
//! # Architecture
//!
//! The network layer consists of:
//! - **Transport trait**: Platform-agnostic interface for the socket
//! - **Message types**: JSON wire frames (`notification`, `pong`, `ping`)
//! - **Message router**: Frame parsing and dispatch to the handler
//! - **Connection manager**: Heartbeat, reconnection with backoff, teardown
//! - **Timers**: One-shot scheduling for heartbeats and backoff
//!
//! # Example
//!
//! ```ignore
//! use dki_core::network::{ConnectionManager, MockScheduler, MockTransport, TransportConfig};
//!
//! // Create a manager with mocks (for testing)
//! let mut conn = ConnectionManager::new(
//!     MockTransport::new(),
//!     MockScheduler::new(),
//!     TransportConfig::default(),
//!     handler,
//! );
//!
//! conn.connect("session-token")?;
//! ```

#[cfg(feature = "testing")]
pub mod connection;
#[cfg(not(feature = "testing"))]
mod connection;

#[cfg(feature = "testing")]
pub mod error;
#[cfg(not(feature = "testing"))]
mod error;

#[cfg(feature = "testing")]
pub mod message;
#[cfg(not(feature = "testing"))]
mod message;

#[cfg(feature = "testing")]
pub mod mock;
#[cfg(not(feature = "testing"))]
mod mock;

#[cfg(feature = "testing")]
pub mod router;
#[cfg(not(feature = "testing"))]
mod router;

#[cfg(feature = "testing")]
pub mod timer;
#[cfg(not(feature = "testing"))]
mod timer;

#[cfg(feature = "testing")]
pub mod transport;
#[cfg(not(feature = "testing"))]
mod transport;

#[cfg(feature = "testing")]
pub mod websocket;
#[cfg(not(feature = "testing"))]
mod websocket;

// Error types
pub use error::{ConfigError, NetworkError};

// Message types
pub use message::{
    InboundFrame, Notification, NotificationCategory, NotificationPriority, OutboundFrame,
};

// Routing
pub use router::{MessageRouter, RouteOutcome};

// Transport abstraction
pub use transport::{
    normalize_base_url, ConnectionId, ConnectionState, Transport, TransportConfig, TransportEvent,
    TransportEventKind, TransportResult, DEFAULT_BASE_URL, NOTIFICATIONS_PATH,
};

// Timers
pub use timer::{Scheduler, TimerId, TokioScheduler};

// Mocks for testing
pub use mock::{MockScheduler, MockTransport};

// WebSocket transport for production
pub use websocket::WebSocketTransport;

// Connection management
pub use connection::ConnectionManager;
