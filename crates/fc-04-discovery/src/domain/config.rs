//! Discovery configuration.

use fc_01_endpoint::Protocol;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cached results older than this are refreshed on demand.
pub const DEFAULT_REFRESH_AGE_MS: u64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Unset means the discoverer's request timeout.
    pub request_timeout_ms: Option<u64>,
    pub refresh_age_ms: u64,
    /// Rewrite discovered hostnames to `localhost`.
    pub as_localhost: bool,
    /// Protocol for discovered peers and orderers. Unset mirrors the
    /// discoverer's own connection.
    pub protocol: Option<Protocol>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: None,
            refresh_age_ms: DEFAULT_REFRESH_AGE_MS,
            as_localhost: false,
            protocol: None,
        }
    }
}

impl DiscoveryConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn refresh_age(&self) -> Duration {
        Duration::from_millis(self.refresh_age_ms)
    }
}
