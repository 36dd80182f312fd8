// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the RouterOS hotspot client

use thiserror::Error;

/// Main client error type
///
/// `Trap` is the only device-level variant. Domain operations convert it into
/// an [`OperationResult`](crate::OperationResult) (or `None` for lookups), so
/// callers only see it from the raw [`MikroTikClient::command`](crate::MikroTikClient::command).
#[derive(Debug, Error)]
pub enum ClientError {
    /// TCP connect failure, premature close or `!fatal` from the device
    #[error("Connection error: {0}")]
    Connection(String),

    /// Socket level IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// No terminating reply for a tag within the configured window
    #[error("Timeout en comunicación con MikroTik")]
    Timeout { tag: u64 },

    /// Login challenge/response rejected
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Malformed sentence or oversized word
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Device-reported command error (`!trap`)
    #[error("RouterOS trap: {message}")]
    Trap { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl ClientError {
    /// Device message carried by a `!trap`, if this is one
    #[must_use]
    pub fn trap_message(&self) -> Option<&str> {
        match self {
            Self::Trap { message } => Some(message),
            _ => None,
        }
    }
}

/// Convenient alias for Result with client error
pub type Result<T> = std::result::Result<T, ClientError>;
