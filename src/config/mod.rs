// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the RouterOS hotspot client
//!
//! Loads and parses configuration from environment variables and JSON.

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;


/// Default configuration values
pub mod defaults {
    pub const ROUTEROS_PORT: u16 = 8728;
    pub const ROUTEROS_USERNAME: &str = "admin";
    pub const ROUTEROS_PASSWORD: &str = "";
    pub const TIMEOUT_SECS: u64 = 10;
    pub const POLL_INTERVAL_SECS: u64 = 30;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const ROUTER_CONFIG: &str = "ROUTER_CONFIG";
    pub const ROUTEROS_HOST: &str = "ROUTEROS_HOST";
    pub const ROUTEROS_PORT: &str = "ROUTEROS_PORT";
    pub const ROUTEROS_USERNAME: &str = "ROUTEROS_USERNAME";
    pub const ROUTEROS_PASSWORD: &str = "ROUTEROS_PASSWORD";
    pub const ROUTEROS_TIMEOUT_SECONDS: &str = "ROUTEROS_TIMEOUT_SECONDS";
    pub const ROUTEROS_LOGIN_METHOD: &str = "ROUTEROS_LOGIN_METHOD";
    pub const POLL_INTERVAL_SECONDS: &str = "POLL_INTERVAL_SECONDS";
}

/// How the client authenticates after the TCP connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    /// MD5 challenge first, plain credentials if the device sends no challenge
    #[default]
    Auto,
    /// MD5 challenge/response only (pre-6.43 firmware)
    Legacy,
    /// Plain `name`/`password` login (6.43+ firmware)
    Plain,
}

impl FromStr for LoginMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "legacy" => Ok(Self::Legacy),
            "plain" => Ok(Self::Plain),
            other => Err(format!("Unknown login method '{other}'")),
        }
    }
}

fn default_port() -> u16 {
    defaults::ROUTEROS_PORT
}

fn default_timeout_secs() -> u64 {
    defaults::TIMEOUT_SECS
}

/// Connection settings for a single MikroTik device
#[derive(Clone, Deserialize)]
pub struct RouterConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub login_method: LoginMethod,
}

// Keep the password out of logs
impl std::fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .field("login_method", &self.login_method)
            .finish()
    }
}

impl RouterConfig {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: defaults::ROUTEROS_PORT,
            username: username.into(),
            password: password.into(),
            timeout_secs: defaults::TIMEOUT_SECS,
            login_method: LoginMethod::default(),
        }
    }

    /// `host:port` string for the TCP connect
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates router configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("Router host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err(format!("Invalid port 0 for router '{}'", self.host));
        }

        if self.username.trim().is_empty() {
            return Err(format!(
                "Username cannot be empty for router '{}'",
                self.host
            ));
        }

        if self.timeout_secs == 0 {
            return Err(format!(
                "Timeout must be at least 1 second for router '{}'",
                self.host
            ));
        }

        Ok(())
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub router: Option<RouterConfig>,
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            router: None,
            poll_interval_secs: defaults::POLL_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        // Whole router as JSON first, discrete variables otherwise
        let router = if let Ok(config_json) = std::env::var(env_vars::ROUTER_CONFIG) {
            serde_json::from_str::<RouterConfig>(&config_json)
                .map_err(|e| {
                    tracing::warn!("Failed to parse {}: {}", env_vars::ROUTER_CONFIG, e);
                })
                .ok()
        } else if let Ok(host) = std::env::var(env_vars::ROUTEROS_HOST) {
            let mut router = RouterConfig::new(
                host,
                std::env::var(env_vars::ROUTEROS_USERNAME)
                    .unwrap_or_else(|_| defaults::ROUTEROS_USERNAME.to_string()),
                std::env::var(env_vars::ROUTEROS_PASSWORD)
                    .unwrap_or_else(|_| defaults::ROUTEROS_PASSWORD.to_string()),
            );
            router.port = parse_var(env_vars::ROUTEROS_PORT).unwrap_or(router.port);
            router.timeout_secs =
                parse_var(env_vars::ROUTEROS_TIMEOUT_SECONDS).unwrap_or(router.timeout_secs);
            router.login_method =
                parse_var(env_vars::ROUTEROS_LOGIN_METHOD).unwrap_or(router.login_method);
            Some(router)
        } else {
            tracing::warn!(
                "No router configuration found. Set {} or {}.",
                env_vars::ROUTER_CONFIG,
                env_vars::ROUTEROS_HOST
            );
            None
        };

        let poll_interval_secs =
            parse_var(env_vars::POLL_INTERVAL_SECONDS).unwrap_or(defaults::POLL_INTERVAL_SECS);

        Config {
            router,
            poll_interval_secs,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid value '{}' for {}", raw, name);
            None
        }
    }
}
