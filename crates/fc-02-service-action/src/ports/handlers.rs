//! # Handler Ports

use crate::domain::{ActionError, PeerOutcome, ProposalResults};
use async_trait::async_trait;
use shared_types::discovery::ChaincodeInterest;
use shared_types::peer::SignedProposal;
use shared_types::{BroadcastResponse, Envelope};
use std::time::Duration;

/// Order in which candidate peers of a plan group are tried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeerSort {
    /// Highest ledger height first.
    #[default]
    LedgerHeight,
    Random,
}

/// Endorsement routing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndorseRequest {
    pub request_timeout: Option<Duration>,
    /// Interest the endorsement plan must satisfy.
    pub interest: Option<ChaincodeInterest>,
    /// MSP ids whose peers must not be used.
    pub ignore_orgs: Vec<String>,
    /// Peer names that must not be used.
    pub ignore_peers: Vec<String>,
    /// MSP ids whose peers are tried first.
    pub preferred_orgs: Vec<String>,
    /// Peer names tried first.
    pub preferred_peers: Vec<String>,
    /// Preferred peers more than this many blocks behind the highest peer
    /// lose their preference.
    pub preferred_height_gap: Option<u64>,
    pub sort: PeerSort,
}

/// Commit routing options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRequest {
    pub request_timeout: Option<Duration>,
    /// Orderers of this MSP are tried before the others.
    pub mspid: Option<String>,
}

#[async_trait]
pub trait EndorseHandler: Send + Sync {
    async fn endorse(
        &self,
        proposal: &SignedProposal,
        request: &EndorseRequest,
    ) -> Result<ProposalResults, ActionError>;
}

#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Settled outcome per peer; only fails when there is nobody to ask.
    async fn query(
        &self,
        proposal: &SignedProposal,
        request_timeout: Option<Duration>,
    ) -> Result<Vec<PeerOutcome>, ActionError>;
}

#[async_trait]
pub trait CommitHandler: Send + Sync {
    async fn commit(
        &self,
        envelope: &Envelope,
        request: &CommitRequest,
    ) -> Result<BroadcastResponse, ActionError>;
}
