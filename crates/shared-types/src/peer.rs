//! # Peer Messages
//!
//! Proposal, proposal response and transaction structures exchanged with
//! endorsing peers and carried inside committed blocks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeId {
    pub name: String,
    pub version: String,
    pub path: String,
}

impl ChaincodeId {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInput {
    /// Function name followed by its arguments.
    pub args: Vec<Vec<u8>>,
    pub decorations: BTreeMap<String, Vec<u8>>,
    pub is_init: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeSpec {
    pub chaincode_id: ChaincodeId,
    pub input: ChaincodeInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInvocationSpec {
    pub chaincode_spec: ChaincodeSpec,
}

/// Channel header extension of an endorser transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeHeaderExtension {
    pub chaincode_id: ChaincodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeProposalPayload {
    /// Encoded [`ChaincodeInvocationSpec`].
    pub input: Vec<u8>,
    /// Private inputs; never written to the ledger.
    pub transient_map: BTreeMap<String, Vec<u8>>,
}

/// Unsigned proposal as sent to endorsers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeProposal {
    /// Encoded [`crate::Header`].
    pub header: Vec<u8>,
    /// Encoded [`ChaincodeProposalPayload`].
    pub payload: Vec<u8>,
    pub extension: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    /// Encoded [`ChaincodeProposal`].
    pub proposal_bytes: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Chaincode response carried in a proposal response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Serialized identity of the endorser.
    pub endorser: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponse {
    pub version: i32,
    pub response: Response,
    /// Encoded [`ProposalResponsePayload`].
    pub payload: Vec<u8>,
    pub endorsement: Option<Endorsement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalResponsePayload {
    pub proposal_hash: Vec<u8>,
    /// Encoded [`ChaincodeAction`].
    pub extension: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeAction {
    pub results: Vec<u8>,
    /// Encoded [`crate::ChaincodeEvent`], empty when no event was set.
    pub events: Vec<u8>,
    pub response: Response,
    pub chaincode_id: Option<ChaincodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeEndorsedAction {
    /// Encoded [`ProposalResponsePayload`].
    pub proposal_response_payload: Vec<u8>,
    pub endorsements: Vec<Endorsement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeActionPayload {
    /// Encoded [`ChaincodeProposalPayload`] with the transient map removed.
    pub chaincode_proposal_payload: Vec<u8>,
    pub action: ChaincodeEndorsedAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAction {
    /// Encoded [`crate::SignatureHeader`].
    pub header: Vec<u8>,
    /// Encoded [`ChaincodeActionPayload`].
    pub payload: Vec<u8>,
}

/// Data section of an endorser transaction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub actions: Vec<TransactionAction>,
}
