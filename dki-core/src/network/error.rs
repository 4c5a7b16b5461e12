// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Network Error Types

use thiserror::Error;

/// Errors raised by the notification transport.
///
/// None of these escape the connection manager as a panic: transport
/// failures feed the reconnect path, parse failures discard the frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Could not establish the socket.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The socket was closed by either side.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation requires an open connection.
    #[error("Transport not connected")]
    NotConnected,

    /// A connection is already open or opening.
    #[error("Connection already open or opening")]
    AlreadyConnected,

    /// No session token available to authenticate the socket.
    #[error("Missing session token")]
    MissingToken,

    /// Reconnect attempts exhausted for this session.
    #[error("Max retries exceeded")]
    MaxRetriesExceeded,

    /// Failed to write a frame.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Failed to read from the socket.
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Inbound frame could not be interpreted.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Endpoint URL could not be built.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while loading transport configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparseable value.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },

    /// Base URL uses a scheme other than ws, wss, http or https.
    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// Base URL did not parse.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::InvalidMessage(err.to_string())
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        NetworkError::InvalidUrl(err.to_string())
    }
}
