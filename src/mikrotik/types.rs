// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Type definitions for hotspot provisioning

use serde::{Deserialize, Serialize};

/// Session lifecycle of a [`MikroTikClient`](super::MikroTikClient)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Authenticating,
    Ready,
}

/// A member to admit through the hotspot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotUser {
    pub mac_address: String,
    pub ip_address: String,
    pub name: String,
    pub membership_tier: String,
    pub session_timeout_secs: u64,
    pub data_limit_mb: Option<u64>,
    pub upload_mbps: u32,
    pub download_mbps: u32,
}

/// One `/ip/hotspot/active` row with every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotspotActiveRow {
    pub id: Option<String>,
    pub mac_address: Option<String>,
    pub address: Option<String>,
    pub user: Option<String>,
    pub uptime: Option<String>,
    pub comment: Option<String>,
    pub bytes_in: Option<u64>,
    pub bytes_out: Option<u64>,
    pub packets_in: Option<u64>,
    pub packets_out: Option<u64>,
}

/// Point-in-time traffic counters of an active session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrafficStats {
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub packets_in: u64,
    pub packets_out: u64,
    pub uptime_secs: u64,
}

/// An active hotspot session as listed by `get_active_users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveUser {
    pub id: String,
    pub mac_address: String,
    pub ip_address: String,
    pub name: String,
    pub uptime: u64,
    pub comment: String,
}

/// Outcome of a hotspot or queue mutation
///
/// Device-side errors end up here instead of in an `Err`, so a loop over
/// many users keeps going past individual failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    #[must_use]
    pub fn ok(id: Option<String>) -> Self {
        Self {
            success: true,
            id,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}
