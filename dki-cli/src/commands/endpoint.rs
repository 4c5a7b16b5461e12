//! Endpoint Command
//!
//! Shows the resolved notification endpoint without connecting.

use anyhow::Result;

use crate::config::CliConfig;
use crate::display;

const REDACTED: &str = "REDACTED";

/// Prints the endpoint URL. The token is redacted unless `show_token` is set.
pub fn run(config: &CliConfig, show_token: bool) -> Result<()> {
    let token = match (&config.token, show_token) {
        (Some(token), true) => token.as_str(),
        (Some(_), false) => REDACTED,
        (None, _) => {
            display::warning("No session token; showing placeholder.");
            REDACTED
        }
    };

    let url = config.transport.endpoint(token)?;
    println!("{}", url);
    println!(
        "  heartbeat: {} ms, retries: {}",
        config.transport.heartbeat_interval_ms, config.transport.max_reconnect_attempts
    );
    Ok(())
}
