// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for convenient use.
//! Users of the library can import everything they need with:
//!
//! ```rust
//! use routeros_hotspot::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, LoginMethod, RouterConfig};
pub use crate::error::{ClientError, Result};

// Metrics
pub use crate::metrics::ClientMetrics;

// MikroTik client
pub use crate::mikrotik::{
    ActiveUser, HotspotActiveRow, HotspotUser, MikroTikClient, OperationResult, SessionState,
    TrafficStats,
};
