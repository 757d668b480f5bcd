//! # Errors

use fc_01_endpoint::ServiceError;
use shared_crypto::CryptoError;
use shared_types::WireError;
use thiserror::Error;

/// A peer that failed during endorsement, with its failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerFailure {
    pub peer: String,
    pub error: ServiceError,
}

/// Errors from building, signing and sending service actions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    /// A required argument was not supplied.
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    /// `sign` or `send` called before `build`.
    #[error("The {0} has not been built")]
    NotBuilt(&'static str),

    /// Envelope requested before `sign`.
    #[error("The {0} has not been signed")]
    NotSigned(&'static str),

    /// A commit needs at least one successful endorsement.
    #[error("No valid endorsements found")]
    NoEndorsements,

    /// No endorsement plan layout could be satisfied.
    #[error("Endorsement has failed: {reason}")]
    EndorsementFailed {
        reason: String,
        failures: Vec<PeerFailure>,
    },

    /// The discovery service could not supply targets.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
