//! Notification Handlers
//!
//! The single registration point through which routed notifications leave
//! the transport.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::network::Notification;

/// Receives notifications as they arrive.
///
/// Called synchronously on the transport's event loop, in arrival order.
/// Keep it short; hand work off elsewhere if it may block.
pub trait NotificationHandler: Send + Sync {
    /// Called once per inbound notification.
    fn on_notification(&self, notification: Notification);
}

/// Closure-based handler.
pub struct CallbackHandler<F>
where
    F: Fn(Notification) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(Notification) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> NotificationHandler for CallbackHandler<F>
where
    F: Fn(Notification) + Send + Sync,
{
    fn on_notification(&self, notification: Notification) {
        (self.callback)(notification);
    }
}

/// Forwards notifications into an unbounded tokio channel.
///
/// Notifications are dropped once the receiver is gone.
#[derive(Clone)]
pub struct ChannelHandler {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelHandler {
    /// Creates a handler and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelHandler { tx }, rx)
    }
}

impl NotificationHandler for ChannelHandler {
    fn on_notification(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("notification receiver dropped; discarding");
        }
    }
}

/// Shared handler reference as stored by the router.
pub type SharedHandler = Arc<dyn NotificationHandler>;
