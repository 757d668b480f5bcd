//! # Commit
//!
//! Turns an endorsed proposal into a transaction envelope for the orderers.

use crate::domain::{ActionError, ActionState, Signable};
use crate::ports::{CommitHandler, CommitRequest};
use fc_01_endpoint::{Connectable, Orderer, ServiceError};
use shared_crypto::IdentityContext;
use shared_types::peer::{
    ChaincodeActionPayload, ChaincodeEndorsedAction, ChaincodeProposal, ChaincodeProposalPayload,
    ProposalResponse, Transaction, TransactionAction,
};
use shared_types::{decode, encode, BroadcastResponse, Envelope, Header, Payload, SignatureHeader};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a commit is sent.
pub enum CommitTargets {
    Orderers(Vec<Arc<Orderer>>),
    Handler(Arc<dyn CommitHandler>),
}

pub struct Commit {
    chaincode_id: String,
    channel_name: String,
    proposal: ChaincodeProposal,
    responses: Vec<ProposalResponse>,
    state: ActionState,
}

impl Commit {
    pub(crate) fn new(
        chaincode_id: &str,
        channel_name: &str,
        proposal: ChaincodeProposal,
        responses: Vec<ProposalResponse>,
    ) -> Self {
        Self {
            chaincode_id: chaincode_id.to_string(),
            channel_name: channel_name.to_string(),
            proposal,
            responses,
            state: ActionState::default(),
        }
    }

    #[must_use]
    pub fn chaincode_id(&self) -> &str {
        &self.chaincode_id
    }

    #[must_use]
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Assemble the transaction payload. The proposal header is reused, so
    /// `identity` must be the proposal's creator.
    pub fn build(&mut self, identity: &dyn IdentityContext) -> Result<Vec<u8>, ActionError> {
        let endorsed: Vec<_> = self
            .responses
            .iter()
            .filter(|r| r.endorsement.is_some())
            .collect();
        let first = endorsed.first().ok_or(ActionError::NoEndorsements)?;

        let header: Header = decode("Header", &self.proposal.header)?;
        let signature_header: SignatureHeader = decode("SignatureHeader", &header.signature_header)?;
        if signature_header.creator != identity.serialize_identity()? {
            return Err(ActionError::Crypto(shared_crypto::CryptoError::InvalidIdentity(
                "commit identity differs from the proposal creator".to_string(),
            )));
        }

        // The transient map never reaches the ledger.
        let mut proposal_payload: ChaincodeProposalPayload =
            decode("ChaincodeProposalPayload", &self.proposal.payload)?;
        proposal_payload.transient_map.clear();

        let action_payload = ChaincodeActionPayload {
            chaincode_proposal_payload: encode("ChaincodeProposalPayload", &proposal_payload)?,
            action: ChaincodeEndorsedAction {
                proposal_response_payload: first.payload.clone(),
                endorsements: endorsed.iter().filter_map(|r| r.endorsement.clone()).collect(),
            },
        };
        let transaction = Transaction {
            actions: vec![TransactionAction {
                header: header.signature_header.clone(),
                payload: encode("ChaincodeActionPayload", &action_payload)?,
            }],
        };
        let payload = Payload {
            header,
            data: encode("Transaction", &transaction)?,
        };
        let bytes = encode("Payload", &payload)?;

        debug!(
            chaincode = %self.chaincode_id,
            endorsements = action_payload.action.endorsements.len(),
            "commit built"
        );
        self.state.set_payload(bytes.clone());
        Ok(bytes)
    }

    /// Send the signed envelope to explicit orderers or through a handler.
    pub async fn send(
        &self,
        targets: CommitTargets,
        request: &CommitRequest,
    ) -> Result<BroadcastResponse, ActionError> {
        let envelope = self.signed_envelope()?;
        match targets {
            CommitTargets::Handler(handler) => handler.commit(&envelope, request).await,
            CommitTargets::Orderers(orderers) => {
                broadcast_first_success(&orderers, &envelope, request.request_timeout).await
            }
        }
    }
}

impl Signable for Commit {
    const ACTION: &'static str = "Commit";

    fn state(&self) -> &ActionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.state
    }
}

/// Try `orderers` in order until one reports `SUCCESS`.
///
/// Transport failures and non-success statuses are logged and skipped;
/// when every orderer fails the last failure is returned.
pub async fn broadcast_first_success(
    orderers: &[Arc<Orderer>],
    envelope: &Envelope,
    request_timeout: Option<Duration>,
) -> Result<BroadcastResponse, ActionError> {
    let mut last_error = ActionError::MissingParameter("targets");
    for orderer in orderers {
        match orderer.send_broadcast(envelope, request_timeout).await {
            Ok(response) if response.status.is_success() => {
                info!(orderer = %orderer.name(), "commit accepted");
                return Ok(response);
            }
            Ok(response) => {
                warn!(orderer = %orderer.name(), status = %response.status, "commit rejected");
                last_error = ActionError::Service(ServiceError::Remote {
                    connection: orderer.connection_info(),
                    status: response.status.to_string(),
                    message: response.info,
                });
            }
            Err(e) => {
                warn!(orderer = %orderer.name(), error = %e, "commit failed");
                last_error = e.into();
            }
        }
    }
    Err(last_error)
}
