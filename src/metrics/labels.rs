// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Label types for Prometheus metrics

use prometheus_client::encoding::EncodeLabelSet;

/// How a tagged command ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    Trap,
    Timeout,
    Error,
}

impl CommandOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Trap => "trap",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

/// How a connect attempt ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Ready,
    ConnectError,
    AuthError,
}

impl ConnectionOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::ConnectError => "connect_error",
            Self::AuthError => "auth_error",
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CommandLabels {
    pub command: String,
    pub outcome: String,
}

impl CommandLabels {
    #[must_use]
    pub fn new(command: &str, outcome: CommandOutcome) -> Self {
        Self {
            command: command.to_string(),
            outcome: outcome.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ConnectionLabels {
    pub outcome: String,
}

impl From<ConnectionOutcome> for ConnectionLabels {
    fn from(outcome: ConnectionOutcome) -> Self {
        Self {
            outcome: outcome.as_str().to_string(),
        }
    }
}
