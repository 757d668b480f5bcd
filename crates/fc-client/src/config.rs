//! # Client Configuration
//!
//! One TOML document carrying the options of every component. Omitted
//! tables and keys take their defaults.
//!
//! ```toml
//! [endpoint]
//! connect_timeout = 3000
//! request_timeout = 45000
//!
//! [event_hub]
//! default_block_type = "filtered"
//! setup_timeout_ms = 10000
//!
//! [discovery]
//! refresh_age_ms = 300000
//! as_localhost = true
//!
//! [logging]
//! level = "info,fc_03_event_hub=debug"
//! json = false
//! ```
//!
//! ## Environment Overrides
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FC_REQUEST_TIMEOUT_MS` | `endpoint.request_timeout` |
//! | `FC_DISCOVERY_AS_LOCALHOST` | `discovery.as_localhost` |
//! | `FC_DISCOVERY_REFRESH_AGE_MS` | `discovery.refresh_age_ms` |
//! | `FC_LOG` | `logging.level` |

use fc_01_endpoint::EndpointOptions;
use fc_03_event_hub::EventHubConfig;
use fc_04_discovery::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const ENV_REQUEST_TIMEOUT_MS: &str = "FC_REQUEST_TIMEOUT_MS";
pub const ENV_DISCOVERY_AS_LOCALHOST: &str = "FC_DISCOVERY_AS_LOCALHOST";
pub const ENV_DISCOVERY_REFRESH_AGE_MS: &str = "FC_DISCOVERY_REFRESH_AGE_MS";
pub const ENV_LOG: &str = "FC_LOG";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: EndpointOptions,
    pub event_hub: EventHubConfig,
    pub discovery: DiscoveryConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Read `path` and apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::parse(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML document without looking at the environment.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value when set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_MS) {
            self.endpoint.request_timeout =
                Duration::from_millis(parse_u64(ENV_REQUEST_TIMEOUT_MS, &value)?);
        }
        if let Some(value) = lookup(ENV_DISCOVERY_AS_LOCALHOST) {
            self.discovery.as_localhost = parse_bool(ENV_DISCOVERY_AS_LOCALHOST, &value)?;
        }
        if let Some(value) = lookup(ENV_DISCOVERY_REFRESH_AGE_MS) {
            self.discovery.refresh_age_ms = parse_u64(ENV_DISCOVERY_REFRESH_AGE_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            if !value.trim().is_empty() {
                self.logging.level = value;
            }
        }
        Ok(())
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
