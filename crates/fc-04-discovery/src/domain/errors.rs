//! # Errors

use fc_01_endpoint::ServiceError;
use fc_02_service_action::ActionError;
use shared_types::WireError;
use thiserror::Error;

/// Errors raised while building, sending or processing discovery requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    /// `get_discovery_results` before any successful `send`.
    #[error("No discovery results found")]
    NoResults,

    /// The discovery service answered with an error result.
    #[error("Discovery service returned error: {0}")]
    Remote(String),

    /// A chaincode query result did not hold exactly one plan.
    #[error("Plan layouts are invalid")]
    InvalidLayouts,

    /// A peer entry could not be turned into a usable peer.
    #[error("Invalid discovered peer {peer}: {reason}")]
    InvalidPeer { peer: String, reason: String },

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl DiscoveryError {
    pub(crate) fn invalid_peer(peer: impl Into<String>, reason: impl Into<String>) -> Self {
        DiscoveryError::InvalidPeer {
            peer: peer.into(),
            reason: reason.into(),
        }
    }
}

impl From<shared_crypto::CryptoError> for DiscoveryError {
    fn from(e: shared_crypto::CryptoError) -> Self {
        DiscoveryError::Action(ActionError::Crypto(e))
    }
}

/// Handlers report discovery trouble through the action error of the
/// request they route.
impl From<DiscoveryError> for ActionError {
    fn from(e: DiscoveryError) -> Self {
        match e {
            DiscoveryError::Action(e) => e,
            DiscoveryError::Service(e) => ActionError::Service(e),
            DiscoveryError::Wire(e) => ActionError::Wire(e),
            other => ActionError::Discovery(other.to_string()),
        }
    }
}
