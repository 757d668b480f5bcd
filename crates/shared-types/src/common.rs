//! # Common Messages
//!
//! Envelope, payload and header structures shared by every request type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of transaction or request carried by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderType {
    Message = 0,
    Config = 1,
    ConfigUpdate = 2,
    EndorserTransaction = 3,
    OrdererTransaction = 4,
    DeliverSeekInfo = 5,
    ChaincodePackage = 6,
}

impl HeaderType {
    /// Numeric wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a header type by wire value.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => HeaderType::Message,
            1 => HeaderType::Config,
            2 => HeaderType::ConfigUpdate,
            3 => HeaderType::EndorserTransaction,
            4 => HeaderType::OrdererTransaction,
            5 => HeaderType::DeliverSeekInfo,
            6 => HeaderType::ChaincodePackage,
            _ => return None,
        })
    }

    /// Symbolic name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderType::Message => "MESSAGE",
            HeaderType::Config => "CONFIG",
            HeaderType::ConfigUpdate => "CONFIG_UPDATE",
            HeaderType::EndorserTransaction => "ENDORSER_TRANSACTION",
            HeaderType::OrdererTransaction => "ORDERER_TRANSACTION",
            HeaderType::DeliverSeekInfo => "DELIVER_SEEK_INFO",
            HeaderType::ChaincodePackage => "CHAINCODE_PACKAGE",
        }
    }
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service-level status reported by orderers and delivery streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Unknown = 0,
    Success = 200,
    BadRequest = 400,
    Forbidden = 403,
    NotFound = 404,
    RequestEntityTooLarge = 413,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

impl Status {
    /// Numeric wire value.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Symbolic name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unknown => "UNKNOWN",
            Status::Success => "SUCCESS",
            Status::BadRequest => "BAD_REQUEST",
            Status::Forbidden => "FORBIDDEN",
            Status::NotFound => "NOT_FOUND",
            Status::RequestEntityTooLarge => "REQUEST_ENTITY_TOO_LARGE",
            Status::InternalServerError => "INTERNAL_SERVER_ERROR",
            Status::NotImplemented => "NOT_IMPLEMENTED",
            Status::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock timestamp as carried in channel headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

/// Channel-scoped header of every payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHeader {
    /// [`HeaderType`] wire value; unknown values are preserved.
    pub header_type: i32,
    pub version: i32,
    pub timestamp: Option<Timestamp>,
    pub channel_id: String,
    pub tx_id: String,
    pub epoch: u64,
    /// Type-specific extension (chaincode header extension for proposals).
    pub extension: Vec<u8>,
    /// SHA-256 of the client TLS certificate when mutual TLS is in use.
    pub tls_cert_hash: Vec<u8>,
}

impl ChannelHeader {
    /// Decoded header type, if known.
    #[must_use]
    pub fn kind(&self) -> Option<HeaderType> {
        HeaderType::from_code(self.header_type)
    }
}

/// Creator identity and nonce of a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Serialized identity of the creator.
    pub creator: Vec<u8>,
    pub nonce: Vec<u8>,
}

/// Payload header. Both fields hold encoded messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Encoded [`ChannelHeader`].
    pub channel_header: Vec<u8>,
    /// Encoded [`SignatureHeader`].
    pub signature_header: Vec<u8>,
}

/// Signed content of an [`Envelope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub header: Header,
    pub data: Vec<u8>,
}

/// Signed payload bytes as sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Encoded [`Payload`] (or request-specific payload).
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}
