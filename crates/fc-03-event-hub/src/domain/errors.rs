//! # Errors

use fc_01_endpoint::ServiceError;
use fc_02_service_action::ActionError;
use shared_types::{BlockNum, WireError};
use thiserror::Error;

/// Errors raised by hub operations. Terminal stream conditions are not
/// errors of this kind; they reach listeners as a
/// [`Termination`](super::Termination).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventHubError {
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("\"startBlock\" ({start}) must not be greater than \"endBlock\" ({end})")]
    InvalidRange { start: BlockNum, end: BlockNum },

    #[error("Invalid chaincode event name pattern: {0}")]
    InvalidPattern(String),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<shared_crypto::CryptoError> for EventHubError {
    fn from(e: shared_crypto::CryptoError) -> Self {
        EventHubError::Action(ActionError::Crypto(e))
    }
}
