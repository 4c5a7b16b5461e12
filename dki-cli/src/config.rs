//! CLI Configuration

use anyhow::{Context, Result};
use dki_core::network::normalize_base_url;
use dki_core::TransportConfig;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Transport settings for the notification socket.
    pub transport: TransportConfig,
    /// Session token, if one was supplied.
    pub token: Option<String>,
}

impl CliConfig {
    /// Builds the config from the `DKI_*` environment, with command-line
    /// values taking precedence.
    pub fn new(url: &str, token: Option<String>, heartbeat_ms: Option<u64>) -> Result<Self> {
        let transport =
            TransportConfig::from_env().context("invalid DKI_* environment variable")?;
        Self::with_transport(transport, url, token, heartbeat_ms)
    }

    fn with_transport(
        mut transport: TransportConfig,
        url: &str,
        token: Option<String>,
        heartbeat_ms: Option<u64>,
    ) -> Result<Self> {
        normalize_base_url(url).with_context(|| format!("invalid --url {:?}", url))?;

        transport.base_url = url.to_string();
        if let Some(ms) = heartbeat_ms {
            transport.heartbeat_interval_ms = ms;
        }

        Ok(CliConfig {
            transport,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Returns the session token or a helpful error.
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .context("No session token. Pass --token or set DKI_TOKEN.")
    }
}
