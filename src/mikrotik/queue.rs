// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Simple queue (QoS) provisioning

use super::client::{MikroTikClient, split_trap};
use super::parse::queue_name;
use super::types::{HotspotUser, OperationResult};
use crate::error::Result;

const QUEUE_ADD: &str = "/queue/simple/add";
const QUEUE_PRINT: &str = "/queue/simple/print";
const QUEUE_REMOVE: &str = "/queue/simple/remove";

impl HotspotUser {
    /// `max-limit` value, download first as RouterOS expects it here
    #[must_use]
    pub fn max_limit(&self) -> String {
        format!("{}M/{}M", self.download_mbps, self.upload_mbps)
    }

    /// Single-host `target` for the queue; an address that already carries a
    /// prefix length is kept as is
    #[must_use]
    pub fn queue_target(&self) -> String {
        if self.ip_address.contains('/') {
            self.ip_address.clone()
        } else {
            format!("{}/32", self.ip_address)
        }
    }
}

impl MikroTikClient {
    /// Creates the bandwidth queue for a user
    ///
    /// # Errors
    ///
    /// Only transport and session failures.
    pub async fn set_traffic_queue(&self, user: &HotspotUser) -> Result<OperationResult> {
        let name = queue_name(&user.mac_address);
        let args = [
            format!("=name={name}"),
            format!("=target={}", user.queue_target()),
            format!("=max-limit={}", user.max_limit()),
            format!("=comment={}", user.comment()),
        ];
        match split_trap(self.command(QUEUE_ADD, &args).await)? {
            Ok(_) => {
                tracing::debug!("Queue {} set to {}", name, user.max_limit());
                Ok(OperationResult::ok(Some(name)))
            }
            Err(message) => {
                tracing::warn!("Creating queue {} failed: {}", name, message);
                Ok(OperationResult::failed(message))
            }
        }
    }

    /// Removes every queue named after `mac`
    ///
    /// # Errors
    ///
    /// Only transport and session failures.
    pub async fn remove_traffic_queue(&self, mac: &str) -> Result<OperationResult> {
        let name = queue_name(mac);
        let query = [format!("?name={name}")];
        let reply = match split_trap(self.command(QUEUE_PRINT, &query).await)? {
            Ok(reply) => reply,
            Err(message) => return Ok(OperationResult::failed(message)),
        };

        let ids: Vec<&String> = reply.rows.iter().filter_map(|row| row.get(".id")).collect();
        if ids.is_empty() {
            return Ok(OperationResult::failed(format!("Queue {name} not found")));
        }
        for id in ids {
            if let Err(message) =
                split_trap(self.command(QUEUE_REMOVE, &[format!("=.id={id}")]).await)?
            {
                return Ok(OperationResult::failed(message));
            }
        }
        tracing::debug!("Queue {} removed", name);
        Ok(OperationResult::ok(Some(name)))
    }
}
