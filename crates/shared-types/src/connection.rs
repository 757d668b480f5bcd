//! Connection characteristics attached to transport failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the remote a failure came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Logical name of the remote (usually `host:port`).
    pub name: String,
    /// Resolved url, empty when the remote was never assigned an endpoint.
    pub url: String,
    pub mspid: Option<String>,
}

impl ConnectionInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            mspid: None,
        }
    }

    #[must_use]
    pub fn with_mspid(mut self, mspid: impl Into<String>) -> Self {
        self.mspid = Some(mspid.into());
        self
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.url.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let info = ConnectionInfo::new("peer0:7051", "grpcs://peer0:7051").with_mspid("Org1MSP");
        assert_eq!(info.to_string(), "peer0:7051 (grpcs://peer0:7051)");
        assert_eq!(ConnectionInfo::new("peer0", "").to_string(), "peer0");
    }
}
