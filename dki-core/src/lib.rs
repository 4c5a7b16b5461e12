//! Don't Kill It! Notification Core
//!
//! Real-time notification transport for the plant-care app: a WebSocket
//! connection that follows the user's session, keeps itself alive with a
//! heartbeat, reconnects with exponential backoff, and hands each inbound
//! notification to a single registered handler.

pub mod client;
pub mod events;
pub mod network;
pub mod session;

pub use client::NotificationClient;
pub use events::{CallbackHandler, ChannelHandler, NotificationHandler, SharedHandler};
pub use network::{
    ConnectionManager, ConnectionState, MessageRouter, MockScheduler, MockTransport, NetworkError,
    Notification, NotificationCategory, NotificationPriority, RouteOutcome, Transport,
    TransportConfig, WebSocketTransport,
};
pub use session::{SessionGate, SessionProvider, SessionState, SessionStore};
