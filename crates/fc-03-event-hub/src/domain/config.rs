//! Hub configuration.

use serde::{Deserialize, Serialize};
use shared_types::BlockType;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventHubConfig {
    /// Block form requested when `build` does not name one.
    pub default_block_type: BlockType,
    /// Setup timer. Unset means the event source's request timeout.
    pub setup_timeout_ms: Option<u64>,
}

impl EventHubConfig {
    #[must_use]
    pub fn setup_timeout(&self) -> Option<Duration> {
        self.setup_timeout_ms.map(Duration::from_millis)
    }
}
