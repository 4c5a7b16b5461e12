//! Listen Command
//!
//! Signs in with the session token and prints notifications as they arrive.

use std::sync::Arc;

use anyhow::Result;
use dki_core::{ChannelHandler, NotificationClient};
use tracing::debug;

use crate::config::CliConfig;
use crate::display;

/// Listens until Ctrl-C, or until `limit` notifications were printed.
pub async fn run(config: &CliConfig, json: bool, limit: Option<usize>) -> Result<()> {
    let token = config.require_token()?.to_string();

    let (handler, mut notifications) = ChannelHandler::new();
    let client = NotificationClient::spawn(config.transport.clone(), Arc::new(handler));
    let mut state = client.subscribe();

    if !json {
        display::info(&format!("Listening on {}", config.transport.base_url));
    }
    client.sign_in(token);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            received = notifications.recv() => {
                let Some(notification) = received else { break };
                if json {
                    println!("{}", serde_json::to_string(notification.payload())?);
                } else {
                    display::notification(&notification);
                }
                printed += 1;
                if limit.is_some_and(|limit| printed >= limit) {
                    break;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if !json {
                    display::connection_state(current);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    debug!(printed, "listener stopping");
    client.shutdown().await;
    Ok(())
}
