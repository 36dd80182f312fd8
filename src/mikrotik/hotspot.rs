// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Hotspot user management
//!
//! Device-side `!trap` errors are returned as data ([`OperationResult`],
//! `None`, `false`); only transport and session failures become `Err`.

use super::client::{MikroTikClient, split_trap};
use super::parse::{NAME_PREFIX, created_id};
use super::types::{ActiveUser, HotspotActiveRow, HotspotUser, OperationResult, TrafficStats};
use crate::error::Result;

const ACTIVE_ADD: &str = "/ip/hotspot/active/add";
const ACTIVE_SET: &str = "/ip/hotspot/active/set";
const ACTIVE_REMOVE: &str = "/ip/hotspot/active/remove";
const ACTIVE_PRINT: &str = "/ip/hotspot/active/print";

/// Error reported when a MAC has no active hotspot session
pub const USER_NOT_FOUND: &str = "Usuario no encontrado en hotspot";

const BYTES_PER_MB: u64 = 1024 * 1024;

impl HotspotUser {
    /// Comment stored on the hotspot entry
    #[must_use]
    pub fn comment(&self) -> String {
        format!("{NAME_PREFIX} {} - {}", self.membership_tier, self.name)
    }
}

impl MikroTikClient {
    /// Admits a user and applies its data cap, if any
    ///
    /// # Errors
    ///
    /// Only transport and session failures. A rejected add is reported in the
    /// returned [`OperationResult`].
    pub async fn add_hotspot_user(&self, user: &HotspotUser) -> Result<OperationResult> {
        let args = [
            format!("=mac-address={}", user.mac_address),
            format!("=address={}", user.ip_address),
            format!("=comment={}", user.comment()),
            format!("=session-timeout={}s", user.session_timeout_secs),
        ];
        let reply = match split_trap(self.command(ACTIVE_ADD, &args).await)? {
            Ok(reply) => reply,
            Err(message) => {
                tracing::warn!("Adding {} to hotspot failed: {}", user.mac_address, message);
                return Ok(OperationResult::failed(message));
            }
        };

        let id = created_id(&reply);
        if let Some(limit_mb) = user.data_limit_mb {
            match id.as_deref() {
                Some(id) => {
                    if !self.set_data_limit(id, limit_mb).await? {
                        tracing::warn!(
                            "Data limit of {} MB not applied to {}",
                            limit_mb,
                            user.mac_address
                        );
                    }
                }
                None => tracing::warn!(
                    "No id returned for {}, data limit skipped",
                    user.mac_address
                ),
            }
        }

        tracing::info!(
            "Hotspot user {} ({}) added with tier {}",
            user.mac_address,
            user.ip_address,
            user.membership_tier
        );
        Ok(OperationResult::ok(id))
    }

    /// Adds every user in order, one result per user
    ///
    /// # Errors
    ///
    /// Stops at the first transport or session failure; device rejections
    /// only mark the corresponding result.
    pub async fn add_hotspot_users(&self, users: &[HotspotUser]) -> Result<Vec<OperationResult>> {
        let mut results = Vec::with_capacity(users.len());
        for user in users {
            results.push(self.add_hotspot_user(user).await?);
        }
        let failed = results.iter().filter(|r| !r.success).count();
        tracing::debug!(
            "Bulk provisioning finished: {} added, {} failed",
            results.len() - failed,
            failed
        );
        Ok(results)
    }

    /// Removes a user's active session and its traffic queue
    ///
    /// # Errors
    ///
    /// Only transport and session failures.
    pub async fn remove_hotspot_user(&self, mac: &str) -> Result<OperationResult> {
        let reply = match split_trap(self.command(ACTIVE_PRINT, &[mac_query(mac)]).await)? {
            Ok(reply) => reply,
            Err(message) => return Ok(OperationResult::failed(message)),
        };
        let Some(id) = reply
            .rows
            .first()
            .and_then(|row| HotspotActiveRow::from_attributes(row).id)
        else {
            tracing::debug!("No active hotspot session for {}", mac);
            return Ok(OperationResult::failed(USER_NOT_FOUND));
        };

        let remove = [format!("=.id={id}")];
        if let Err(message) = split_trap(self.command(ACTIVE_REMOVE, &remove).await)? {
            tracing::warn!("Removing {} from hotspot failed: {}", mac, message);
            return Ok(OperationResult::failed(message));
        }

        let queue = self.remove_traffic_queue(mac).await?;
        if !queue.success {
            tracing::warn!(
                "Queue cleanup for {} failed: {}",
                mac,
                queue.error.as_deref().unwrap_or("unknown")
            );
        }

        tracing::info!("Hotspot user {} removed", mac);
        Ok(OperationResult::ok(Some(id)))
    }

    /// Typed active-session row for a MAC, `None` without a session
    ///
    /// # Errors
    ///
    /// Only transport and session failures.
    pub async fn get_hotspot_row(&self, mac: &str) -> Result<Option<HotspotActiveRow>> {
        match split_trap(self.command(ACTIVE_PRINT, &[mac_query(mac)]).await)? {
            Ok(reply) => Ok(reply.rows.first().map(HotspotActiveRow::from_attributes)),
            Err(message) => {
                tracing::warn!("Hotspot lookup for {} failed: {}", mac, message);
                Ok(None)
            }
        }
    }

    /// Traffic counters of a MAC's active session
    ///
    /// Missing or unparseable counters read as 0; use [`Self::get_hotspot_row`]
    /// to tell them apart.
    ///
    /// # Errors
    ///
    /// Only transport and session failures.
    pub async fn get_user_traffic_stats(&self, mac: &str) -> Result<Option<TrafficStats>> {
        Ok(self
            .get_hotspot_row(mac)
            .await?
            .map(|row| TrafficStats::from(&row)))
    }

    /// Caps both directions of an active session at `limit_mb` megabytes
    ///
    /// # Errors
    ///
    /// Only transport and session failures; a rejected set returns `false`.
    pub async fn set_data_limit(&self, user_id: &str, limit_mb: u64) -> Result<bool> {
        let limit_bytes = limit_mb.saturating_mul(BYTES_PER_MB);
        let args = [
            format!("=.id={user_id}"),
            format!("=limit-bytes-in={limit_bytes}"),
            format!("=limit-bytes-out={limit_bytes}"),
        ];
        match split_trap(self.command(ACTIVE_SET, &args).await)? {
            Ok(_) => Ok(true),
            Err(message) => {
                tracing::warn!("Setting data limit on {} failed: {}", user_id, message);
                Ok(false)
            }
        }
    }

    /// Every active hotspot session
    ///
    /// # Errors
    ///
    /// Only transport and session failures; a rejected listing is empty.
    pub async fn get_active_users(&self) -> Result<Vec<ActiveUser>> {
        let reply = match split_trap(self.command(ACTIVE_PRINT, &[] as &[&str]).await)? {
            Ok(reply) => reply,
            Err(message) => {
                tracing::warn!("Listing active hotspot users failed: {}", message);
                return Ok(Vec::new());
            }
        };
        let users: Vec<ActiveUser> = reply
            .rows
            .iter()
            .map(|row| ActiveUser::from(HotspotActiveRow::from_attributes(row)))
            .collect();
        self.metrics().set_active_users(users.len());
        Ok(users)
    }
}

fn mac_query(mac: &str) -> String {
    format!("?mac-address={mac}")
}
