// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! High-level MikroTik client: session lifecycle and raw commands

use std::sync::Arc;
use tokio::sync::Mutex;

use super::connection::{Reply, RouterOsConnection};
use super::types::SessionState;
use crate::config::RouterConfig;
use crate::error::{ClientError, Result};
use crate::metrics::{ClientMetrics, CommandOutcome, ConnectionOutcome};

#[derive(Default)]
struct Session {
    state: SessionState,
    conn: Option<Arc<RouterOsConnection>>,
}

/// `MikroTik` `RouterOS` API client
///
/// Owns at most one connection to one device. Construct it once and share it
/// (e.g. behind an `Arc`); every domain operation reconnects on demand if the
/// previous connection was lost.
pub struct MikroTikClient {
    config: RouterConfig,
    session: Mutex<Session>,
    metrics: ClientMetrics,
}

impl MikroTikClient {
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        Self::with_metrics(config, ClientMetrics::new())
    }

    /// Creates a client that records into an existing metrics registry
    #[must_use]
    pub fn with_metrics(config: RouterConfig, metrics: ClientMetrics) -> Self {
        Self {
            config,
            session: Mutex::new(Session::default()),
            metrics,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    pub async fn state(&self) -> SessionState {
        let session = self.session.lock().await;
        match &session.conn {
            Some(conn) if conn.is_closed() => SessionState::Disconnected,
            _ => session.state,
        }
    }

    /// Opens a fresh connection and logs in, replacing any existing one
    ///
    /// # Errors
    ///
    /// `Connection` when the TCP connect fails or times out, `Authentication`
    /// when the device rejects the credentials.
    pub async fn connect(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if let Some(old) = session.conn.take() {
            old.close().await;
        }
        self.open(&mut session).await.map(|_| ())
    }

    /// Sends `/quit` (best effort) and closes the socket
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        if let Some(conn) = session.conn.take() {
            tracing::debug!("Disconnecting from {}", self.config.address());
            conn.close().await;
        }
        session.state = SessionState::Disconnected;
    }

    pub(super) async fn ensure_connected(&self) -> Result<Arc<RouterOsConnection>> {
        let mut session = self.session.lock().await;
        if let Some(conn) = &session.conn {
            if !conn.is_closed() {
                return Ok(conn.clone());
            }
            tracing::debug!("Connection to {} lost, reconnecting", self.config.address());
        }
        self.open(&mut session).await
    }

    async fn open(&self, session: &mut Session) -> Result<Arc<RouterOsConnection>> {
        session.conn = None;
        session.state = SessionState::Connecting;
        let addr = self.config.address();

        let conn = match RouterOsConnection::connect(&addr, self.config.timeout()).await {
            Ok(conn) => conn,
            Err(e) => {
                session.state = SessionState::Disconnected;
                self.metrics.record_connection(ConnectionOutcome::ConnectError);
                tracing::warn!("Failed to connect to {}: {}", addr, e);
                return Err(e);
            }
        };

        session.state = SessionState::Authenticating;
        if let Err(e) = conn
            .login(
                &self.config.username,
                &self.config.password,
                self.config.login_method,
            )
            .await
        {
            conn.close().await;
            session.state = SessionState::Disconnected;
            if matches!(e, ClientError::Authentication(_)) {
                self.metrics.record_connection(ConnectionOutcome::AuthError);
                tracing::error!("Login to {} failed: {}", addr, e);
            } else {
                // transport failure mid-login, not a credentials problem
                self.metrics.record_connection(ConnectionOutcome::ConnectError);
                tracing::warn!("Connection to {} lost during login: {}", addr, e);
            }
            return Err(e);
        }

        tracing::info!("Connected to RouterOS at {}", addr);
        self.metrics.record_connection(ConnectionOutcome::Ready);
        let conn = Arc::new(conn);
        session.state = SessionState::Ready;
        session.conn = Some(conn.clone());
        Ok(conn)
    }

    /// Runs one raw command, connecting first if needed
    ///
    /// # Errors
    ///
    /// Transport and session errors, plus `Trap` when the device rejects the
    /// command.
    pub async fn command<S: AsRef<str>>(&self, path: &str, args: &[S]) -> Result<Reply> {
        let conn = self.ensure_connected().await?;
        let result = conn.command(path, args).await;
        let outcome = match &result {
            Ok(_) => CommandOutcome::Done,
            Err(ClientError::Trap { .. }) => CommandOutcome::Trap,
            Err(ClientError::Timeout { .. }) => CommandOutcome::Timeout,
            Err(_) => CommandOutcome::Error,
        };
        self.metrics.record_command(path, outcome);
        result
    }
}

/// Separates device-level `!trap` errors from transport failures
///
/// The outer `Result` carries errors that must reach the caller; the inner
/// one is the device's answer.
pub(super) fn split_trap(
    result: Result<Reply>,
) -> Result<std::result::Result<Reply, String>> {
    match result {
        Ok(reply) => Ok(Ok(reply)),
        Err(ClientError::Trap { message }) => Ok(Err(message)),
        Err(e) => Err(e),
    }
}
