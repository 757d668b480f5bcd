//! # Errors
//!
//! Transport failures as reported by port implementations, and the
//! service-level errors that attach the remote's connection characteristics.

use shared_types::ConnectionInfo;
use thiserror::Error;

/// Failure reported by a transport port implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Errors from endpoints, peers, orderers and the channel registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// A required argument was not supplied.
    #[error("Missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("This service endpoint {connection} is already connected")]
    AlreadyConnected { connection: ConnectionInfo },

    #[error("Service endpoint {connection} is not connected")]
    NotConnected { connection: ConnectionInfo },

    #[error("Failed to connect to {connection}: {reason}")]
    ConnectFailed {
        connection: ConnectionInfo,
        reason: String,
    },

    /// The remote did not answer in time.
    #[error("REQUEST_TIMEOUT: {operation} to {connection} timed out after {timeout_ms}ms")]
    Timeout {
        connection: ConnectionInfo,
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("{operation} to {connection} failed: {reason}")]
    Transport {
        connection: ConnectionInfo,
        operation: &'static str,
        reason: String,
    },

    /// The remote answered with a failure status.
    #[error("{connection} returned status {status}: {message}")]
    Remote {
        connection: ConnectionInfo,
        status: String,
        message: String,
    },

    #[error("{kind} {name} already exists")]
    Duplicate { kind: &'static str, name: String },
}

impl ServiceError {
    /// Remote the failure came from, when known.
    #[must_use]
    pub fn connection(&self) -> Option<&ConnectionInfo> {
        match self {
            ServiceError::AlreadyConnected { connection }
            | ServiceError::NotConnected { connection }
            | ServiceError::ConnectFailed { connection, .. }
            | ServiceError::Timeout { connection, .. }
            | ServiceError::Transport { connection, .. }
            | ServiceError::Remote { connection, .. } => Some(connection),
            ServiceError::MissingParameter(_)
            | ServiceError::InvalidUrl(_)
            | ServiceError::Duplicate { .. } => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Timeout { .. })
    }
}
