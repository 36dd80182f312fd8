//! `MikroTik` `RouterOS` API client module
//!
//! This module provides the RouterOS API wire codec, the tagged session layer
//! and the hotspot/queue operations built on top of it.

mod client;
mod connection;
mod hotspot;
mod parse;
mod queue;
mod types;

// Re-export public types and functions
pub use client::MikroTikClient;
pub use connection::{
    Attributes, MAX_WORD_LEN, Reply, ReplyKind, Sentence, SentenceDecoder, decode_length,
    decode_sentence, decode_word, encode_length, encode_sentence, encode_word,
};
pub use hotspot::USER_NOT_FOUND;
pub use parse::{parse_uptime_to_seconds, queue_name};
pub use types::{
    ActiveUser, HotspotActiveRow, HotspotUser, OperationResult, SessionState, TrafficStats,
};
