//! # Proposal Results
//!
//! Per-peer outcomes of a proposal fan-out, split into responses and errors.

use super::errors::PeerFailure;
use fc_01_endpoint::{Connectable, Peer, ServiceError};
use shared_types::peer::ProposalResponse;
use shared_types::ConnectionInfo;

/// Lowest chaincode status treated as a failure.
pub const ERROR_STATUS: i32 = 400;

/// Chaincode status of a clean execution.
pub const SUCCESS_STATUS: i32 = 200;

/// Settled result of sending to one peer. Never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerOutcome {
    pub peer: String,
    pub connection: ConnectionInfo,
    pub result: Result<ProposalResponse, ServiceError>,
}

impl PeerOutcome {
    pub fn new(peer: &Peer, result: Result<ProposalResponse, ServiceError>) -> Self {
        Self {
            peer: peer.name().to_string(),
            connection: peer.connection_info(),
            result,
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Response from a peer whose chaincode status was below 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerResponse {
    pub peer: String,
    pub connection: ConnectionInfo,
    pub response: ProposalResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalResults {
    pub responses: Vec<PeerResponse>,
    pub errors: Vec<PeerFailure>,
}

impl ProposalResults {
    /// Classify settled outcomes. Responses with status >= 400 become
    /// remote errors carrying the chaincode message.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = PeerOutcome>) -> Self {
        let mut results = Self::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(response) if response.response.status >= ERROR_STATUS => {
                    results.errors.push(PeerFailure {
                        peer: outcome.peer,
                        error: ServiceError::Remote {
                            connection: outcome.connection,
                            status: response.response.status.to_string(),
                            message: response.response.message,
                        },
                    });
                }
                Ok(response) => results.responses.push(PeerResponse {
                    peer: outcome.peer,
                    connection: outcome.connection,
                    response,
                }),
                Err(error) => results.errors.push(PeerFailure {
                    peer: outcome.peer,
                    error,
                }),
            }
        }
        results
    }

    /// Payloads of responses with status 200.
    #[must_use]
    pub fn query_results(&self) -> Vec<Vec<u8>> {
        self.responses
            .iter()
            .filter(|r| r.response.response.status == SUCCESS_STATUS)
            .map(|r| r.response.response.payload.clone())
            .collect()
    }

    /// True when there is at least one response and all carry the same
    /// proposal response payload.
    #[must_use]
    pub fn compare_results(&self) -> bool {
        let mut payloads = self.responses.iter().map(|r| &r.response.payload);
        match payloads.next() {
            Some(first) => payloads.all(|p| p == first),
            None => false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty() && self.errors.is_empty()
    }
}
