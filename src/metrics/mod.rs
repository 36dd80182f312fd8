// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Client metrics
//!
//! Counters for commands and connect attempts plus an active-user gauge,
//! rendered in the Prometheus text format for whatever HTTP layer embeds
//! the client.

mod labels;
mod registry;

/// Outcome kinds used as label values
pub use labels::{CommandOutcome, ConnectionOutcome};

/// Prometheus metrics registry
pub use registry::ClientMetrics;
