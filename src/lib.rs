// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # RouterOS Hotspot
//!
//! Client for the MikroTik RouterOS API aimed at hotspot provisioning.
//!
//! The crate speaks the binary RouterOS API directly: length-prefixed words,
//! tagged sentences and the MD5 challenge login. On top of that session layer
//! it offers hotspot user management, simple-queue bandwidth limits and
//! traffic statistics.
//!
//! ## Main modules
//! - `config`: configuration management
//! - `error`: error types
//! - `metrics`: Prometheus counters for commands and connections
//! - `mikrotik`: wire codec, session and hotspot operations
//! - `prelude`: commonly used types and traits

mod config;
mod error;
mod metrics;
mod mikrotik;
pub mod prelude;

// Re-export commonly used types
/// Client configuration
pub use config::{Config, LoginMethod, RouterConfig};

/// Client error and result type
pub use error::{ClientError, Result};

/// Client metrics
pub use metrics::{ClientMetrics, CommandOutcome, ConnectionOutcome};

/// Client, domain types and operation results
pub use mikrotik::{
    ActiveUser, HotspotActiveRow, HotspotUser, MikroTikClient, OperationResult, Reply,
    SessionState, TrafficStats, USER_NOT_FOUND, parse_uptime_to_seconds, queue_name,
};

/// RouterOS wire protocol codec
pub use mikrotik::{
    Attributes, MAX_WORD_LEN, ReplyKind, Sentence, SentenceDecoder, decode_length,
    decode_sentence, decode_word, encode_length, encode_sentence, encode_word,
};
