// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry and update logic

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::labels::{CommandLabels, CommandOutcome, ConnectionLabels, ConnectionOutcome};
use crate::error::{ClientError, Result};

#[derive(Clone)]
pub struct ClientMetrics {
    registry: Arc<Mutex<Registry>>,
    commands: Family<CommandLabels, Counter>,
    connections: Family<ConnectionLabels, Counter>,
    hotspot_active_users: Gauge,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let commands = Family::<CommandLabels, Counter>::default();
        registry.register(
            "routeros_commands",
            "RouterOS API commands by path and outcome",
            commands.clone(),
        );
        let connections = Family::<ConnectionLabels, Counter>::default();
        registry.register(
            "routeros_connections",
            "Connect and login attempts by outcome",
            connections.clone(),
        );
        let hotspot_active_users = Gauge::default();
        registry.register(
            "routeros_hotspot_active_users",
            "Active hotspot sessions seen by the last listing",
            hotspot_active_users.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            commands,
            connections,
            hotspot_active_users,
        }
    }

    pub async fn encode_metrics(&self) -> Result<String> {
        let registry = self.registry.lock().await;
        let mut buffer = String::new();
        encode(&mut buffer, &registry).map_err(|e| ClientError::Metrics(e.to_string()))?;
        Ok(buffer)
    }

    pub fn record_command(&self, command: &str, outcome: CommandOutcome) {
        self.commands
            .get_or_create(&CommandLabels::new(command, outcome))
            .inc();
    }

    pub fn record_connection(&self, outcome: ConnectionOutcome) {
        self.connections
            .get_or_create(&ConnectionLabels::from(outcome))
            .inc();
    }

    pub fn set_active_users(&self, count: usize) {
        #[allow(clippy::cast_possible_wrap)]
        self.hotspot_active_users.set(count as i64);
    }

    #[must_use]
    pub fn command_count(&self, command: &str, outcome: CommandOutcome) -> u64 {
        self.commands
            .get_or_create(&CommandLabels::new(command, outcome))
            .get()
    }

    #[must_use]
    pub fn connection_count(&self, outcome: ConnectionOutcome) -> u64 {
        self.connections
            .get_or_create(&ConnectionLabels::from(outcome))
            .get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_command() {
        let metrics = ClientMetrics::new();
        metrics.record_command("/ip/hotspot/active/print", CommandOutcome::Done);
        metrics.record_command("/ip/hotspot/active/print", CommandOutcome::Done);
        metrics.record_command("/ip/hotspot/active/add", CommandOutcome::Trap);

        assert_eq!(
            metrics.command_count("/ip/hotspot/active/print", CommandOutcome::Done),
            2
        );
        assert_eq!(
            metrics.command_count("/ip/hotspot/active/add", CommandOutcome::Trap),
            1
        );
        assert_eq!(
            metrics.command_count("/ip/hotspot/active/add", CommandOutcome::Done),
            0
        );
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = ClientMetrics::new();
        let other = metrics.clone();
        other.record_connection(ConnectionOutcome::Ready);
        assert_eq!(metrics.connection_count(ConnectionOutcome::Ready), 1);
    }

    #[tokio::test]
    async fn test_encode_metrics() {
        let metrics = ClientMetrics::new();
        metrics.record_command("/queue/simple/add", CommandOutcome::Timeout);
        metrics.record_connection(ConnectionOutcome::AuthError);
        metrics.set_active_users(7);

        let text = metrics.encode_metrics().await.unwrap();
        assert!(text.contains("routeros_commands_total"));
        assert!(text.contains("outcome=\"timeout\""));
        assert!(text.contains("routeros_connections_total"));
        assert!(text.contains("routeros_hotspot_active_users 7"));
    }
}
