// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS response parsing helpers

use super::connection::{Attributes, Reply};
use super::types::{ActiveUser, HotspotActiveRow, TrafficStats};

/// Prefix of every queue and comment this client creates
pub const NAME_PREFIX: &str = "EntrenaTech";

/// Deterministic simple-queue name for a MAC address
///
/// `00:11:22:33:44:55` becomes `EntrenaTech-001122334455`, so removal can
/// find the queue by name without remembering its id.
#[must_use]
pub fn queue_name(mac: &str) -> String {
    let compact: String = mac.chars().filter(|c| *c != ':').collect();
    format!("{NAME_PREFIX}-{compact}")
}

/// Parse a RouterOS uptime string to seconds
///
/// Accepts any subset of `<N>w<N>d<N>h<N>m<N>s`. Unknown tokens, bare
/// trailing numbers and millisecond parts (`500ms`) are ignored.
#[must_use]
pub fn parse_uptime_to_seconds(s: &str) -> u64 {
    let mut total = 0u64;
    let mut num = String::new();
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_ascii_digit() {
            num.push(ch);
            continue;
        }
        if num.is_empty() {
            continue;
        }
        let value = num.parse::<u64>().unwrap_or(0);
        num.clear();
        let unit_seconds = match ch {
            'w' => 7 * 24 * 3600,
            'd' => 24 * 3600,
            'h' => 3600,
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                0
            }
            'm' => 60,
            's' => 1,
            _ => 0,
        };
        total = total.saturating_add(value.saturating_mul(unit_seconds));
    }
    total
}

fn parse_u64(row: &Attributes, key: &str) -> Option<u64> {
    row.get(key).and_then(|v| v.trim().parse().ok())
}

impl HotspotActiveRow {
    #[must_use]
    pub fn from_attributes(row: &Attributes) -> Self {
        Self {
            id: row.get(".id").cloned(),
            mac_address: row.get("mac-address").cloned(),
            address: row.get("address").cloned(),
            user: row.get("user").cloned(),
            uptime: row.get("uptime").cloned(),
            comment: row.get("comment").cloned(),
            bytes_in: parse_u64(row, "bytes-in"),
            bytes_out: parse_u64(row, "bytes-out"),
            packets_in: parse_u64(row, "packets-in"),
            packets_out: parse_u64(row, "packets-out"),
        }
    }
}

impl From<&HotspotActiveRow> for TrafficStats {
    fn from(row: &HotspotActiveRow) -> Self {
        Self {
            bytes_in: row.bytes_in.unwrap_or(0),
            bytes_out: row.bytes_out.unwrap_or(0),
            packets_in: row.packets_in.unwrap_or(0),
            packets_out: row.packets_out.unwrap_or(0),
            uptime_secs: row.uptime.as_deref().map_or(0, parse_uptime_to_seconds),
        }
    }
}

impl From<HotspotActiveRow> for ActiveUser {
    fn from(row: HotspotActiveRow) -> Self {
        Self {
            uptime: row.uptime.as_deref().map_or(0, parse_uptime_to_seconds),
            id: row.id.unwrap_or_default(),
            mac_address: row.mac_address.unwrap_or_default(),
            ip_address: row.address.unwrap_or_default(),
            name: row.user.unwrap_or_default(),
            comment: row.comment.unwrap_or_default(),
        }
    }
}

/// Id of the item created by an `add` command
///
/// RouterOS reports it as `ret` on the `!done` sentence; some builds send it
/// as a `.id` row instead.
#[must_use]
pub fn created_id(reply: &Reply) -> Option<String> {
    reply
        .done
        .get("ret")
        .or_else(|| reply.rows.iter().find_map(|row| row.get(".id")))
        .cloned()
}
