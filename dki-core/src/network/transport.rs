//! Transport Trait
//!
//! Platform-agnostic abstraction for the notification socket.
//!
//! The connection manager never blocks on the socket: `open` only starts a
//! connection attempt, and everything that happens afterwards is reported
//! back as a [`TransportEvent`] tagged with the [`ConnectionId`] it belongs to.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use url::Url;

use super::error::{ConfigError, NetworkError};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, NetworkError>;

/// Lifecycle state of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never connected.
    #[default]
    Idle,
    /// Open requested, waiting for the transport.
    Connecting,
    /// Socket open, heartbeat running.
    Open,
    /// Teardown in progress.
    Closing,
    /// Socket gone; a reconnect may be pending.
    Closed,
}

impl ConnectionState {
    /// Returns true for `Connecting` and `Open`.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one connection attempt.
///
/// Every attempt gets a fresh ID, so events from a superseded socket can
/// be recognized and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next ID.
    pub fn next() -> Self {
        ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something that happened on a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// Handshake completed.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// Transport-level error; a `Closed` event follows.
    Error(NetworkError),
    /// Socket closed, including failed connection attempts.
    Closed,
}

/// A transport event tagged with its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection: ConnectionId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(connection: ConnectionId, kind: TransportEventKind) -> Self {
        TransportEvent { connection, kind }
    }
}

/// Default transport endpoint origin.
pub const DEFAULT_BASE_URL: &str = "ws://localhost:8000/api/v1";

/// Path of the notification endpoint, relative to the base URL.
pub const NOTIFICATIONS_PATH: &str = "ws/notifications";

/// Configuration for the notification transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Origin plus API prefix, e.g. `wss://api.example.com/api/v1`.
    /// `http(s)` is accepted and mapped to `ws(s)`.
    pub base_url: String,
    /// Interval between pings while open (milliseconds).
    pub heartbeat_interval_ms: u64,
    /// Maximum reconnection attempts per session.
    pub max_reconnect_attempts: u32,
    /// Base delay for exponential backoff (milliseconds).
    pub reconnect_base_delay_ms: u64,
    /// Upper bound for a single backoff delay (milliseconds).
    pub reconnect_max_delay_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            heartbeat_interval_ms: 30_000,
            max_reconnect_attempts: 5,
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 30_000,
        }
    }
}

impl TransportConfig {
    /// Environment variable for the base URL.
    pub const ENV_BASE_URL: &'static str = "DKI_WS_URL";
    /// Environment variable for the heartbeat interval.
    pub const ENV_HEARTBEAT_MS: &'static str = "DKI_HEARTBEAT_MS";
    /// Environment variable for the reconnect bound.
    pub const ENV_MAX_RECONNECT_ATTEMPTS: &'static str = "DKI_MAX_RECONNECT_ATTEMPTS";

    /// Creates a config for the given base URL with default timings.
    pub fn with_base_url(base_url: &str) -> Self {
        TransportConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    /// Overrides the heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_ms = saturating_millis(interval);
        self
    }

    /// Overrides the backoff parameters.
    pub fn with_backoff(mut self, base: Duration, max: Duration, attempts: u32) -> Self {
        self.reconnect_base_delay_ms = saturating_millis(base);
        self.reconnect_max_delay_ms = saturating_millis(max);
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Loads the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config through an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = TransportConfig::default();

        if let Some(base_url) = lookup(Self::ENV_BASE_URL) {
            normalize_base_url(&base_url)?;
            config.base_url = base_url;
        }
        if let Some(value) = lookup(Self::ENV_HEARTBEAT_MS) {
            config.heartbeat_interval_ms = parse_value(Self::ENV_HEARTBEAT_MS, &value)?;
        }
        if let Some(value) = lookup(Self::ENV_MAX_RECONNECT_ATTEMPTS) {
            config.max_reconnect_attempts =
                parse_value(Self::ENV_MAX_RECONNECT_ATTEMPTS, &value)?;
        }

        Ok(config)
    }

    /// Heartbeat interval as a `Duration`.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Backoff delay before reconnect attempt number `attempt` (0-based):
    /// `min(base * 2^attempt, max)`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        let delay = self
            .reconnect_base_delay_ms
            .saturating_mul(factor)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(delay)
    }

    /// Builds `{base}/ws/notifications?token={token}`.
    pub fn endpoint(&self, token: &str) -> TransportResult<Url> {
        let base = normalize_base_url(&self.base_url)
            .map_err(|e| NetworkError::InvalidUrl(e.to_string()))?;

        let mut url = Url::parse(&format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            NOTIFICATIONS_PATH
        ))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

/// Parses a base URL and maps `http(s)` to `ws(s)`.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };
    if url.scheme() != scheme {
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::UnsupportedScheme(url.scheme().to_string()))?;
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Milliseconds in `duration`, clamped to `u64::MAX`.
fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Transport trait for the notification socket.
///
/// Implementations are event sources: they report `Opened`, `Frame`,
/// `Error` and `Closed` asynchronously for the connection IDs they were
/// asked to open. A failed attempt must still produce `Closed`.
pub trait Transport: Send {
    /// Starts opening a connection. Returns without waiting for the handshake.
    ///
    /// An `Err` means the attempt could not even be started.
    fn open(&mut self, connection: ConnectionId, endpoint: &Url) -> TransportResult<()>;

    /// Queues a text frame on an open connection.
    fn send(&mut self, connection: ConnectionId, frame: &str) -> TransportResult<()>;

    /// Closes a connection. Safe to call for unknown or already closed IDs.
    fn close(&mut self, connection: ConnectionId);
}
