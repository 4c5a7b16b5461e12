// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Router
//!
//! Interprets inbound frames and dispatches notifications to the
//! registered handler.

use tracing::{debug, warn};

use super::message::InboundFrame;
use crate::events::SharedHandler;

/// What the router did with a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Notification handed to the handler.
    Delivered,
    /// Heartbeat acknowledgment; nothing to do.
    Pong,
    /// Well-formed frame of an unknown type.
    Ignored(String),
    /// Frame could not be parsed; carries the parse error.
    Discarded(String),
}

/// Routes inbound frames to a single handler.
///
/// Never fails: a malformed frame is logged and dropped so it cannot take
/// the connection down with it. No buffering and no deduplication.
pub struct MessageRouter {
    handler: SharedHandler,
}

impl MessageRouter {
    /// Creates a router dispatching to `handler`.
    pub fn new(handler: SharedHandler) -> Self {
        MessageRouter { handler }
    }

    /// Routes one raw text frame.
    pub fn route(&self, raw: &str) -> RouteOutcome {
        match InboundFrame::parse(raw) {
            Ok(InboundFrame::Notification(notification)) => {
                debug!(id = notification.id(), "notification received");
                self.handler.on_notification(notification);
                RouteOutcome::Delivered
            }
            Ok(InboundFrame::Pong) => RouteOutcome::Pong,
            Ok(InboundFrame::Other(kind)) => {
                debug!(%kind, "ignoring frame of unknown type");
                RouteOutcome::Ignored(kind)
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed frame");
                RouteOutcome::Discarded(e.to_string())
            }
        }
    }
}
