//! # Wire Codec
//!
//! Encoding of nested messages into the byte fields that cross the
//! transport boundary. Payload bytes produced here are what gets signed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors from encoding or decoding wire messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// A message could not be serialized.
    #[error("Failed to encode {what}: {reason}")]
    Encode {
        /// Message being encoded.
        what: &'static str,
        /// Underlying codec failure.
        reason: String,
    },

    /// A byte field could not be decoded into the expected message.
    #[error("Failed to decode {what}: {reason}")]
    Decode {
        /// Message being decoded.
        what: &'static str,
        /// Underlying codec failure.
        reason: String,
    },

    /// A message decoded but its content is structurally invalid.
    #[error("Malformed {what}: {reason}")]
    Malformed {
        /// Message being inspected.
        what: &'static str,
        /// What was wrong with it.
        reason: String,
    },
}

/// Encode a message into its wire bytes.
pub fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, WireError> {
    bincode::serialize(value).map_err(|e| WireError::Encode {
        what,
        reason: e.to_string(),
    })
}

/// Decode wire bytes into a message.
pub fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, WireError> {
    bincode::deserialize(bytes).map_err(|e| WireError::Decode {
        what,
        reason: e.to_string(),
    })
}
