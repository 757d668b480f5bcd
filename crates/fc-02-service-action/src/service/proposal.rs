//! # Proposal
//!
//! Chaincode proposals. An [`Endorsement`] collects endorsements for a
//! transaction to be committed; a [`Query`] only reads the results.
//!
//! ```text
//! Proposal
//! ├── build(identity, request)   # channel header, signature header, invocation spec
//! ├── sign / sign_with           # via Signable
//! ├── build_proposal_interest()  # what discovery must plan for
//! └── send_to_targets(peers)     # concurrent fan-out, settle-all
//! Endorsement::send  -> targets | EndorseHandler
//! Query::send        -> targets | QueryHandler
//! ```

use super::commit::Commit;
use super::header::{channel_header, header};
use crate::domain::{ActionError, ActionState, PeerOutcome, ProposalResults, Signable};
use crate::ports::{EndorseHandler, EndorseRequest, QueryHandler};
use fc_01_endpoint::{Connectable, Peer};
use futures::future::join_all;
use shared_crypto::{IdentityContext, TransactionId};
use shared_types::discovery::{ChaincodeCall, ChaincodeInterest};
use shared_types::peer::{
    ChaincodeHeaderExtension, ChaincodeId, ChaincodeInput, ChaincodeInvocationSpec,
    ChaincodeProposal, ChaincodeProposalPayload, ChaincodeSpec, SignedProposal,
};
use shared_types::{encode, HeaderType};
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalKind {
    Endorsement,
    Query,
}

/// Invocation arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProposalRequest {
    pub fcn: String,
    pub args: Vec<Vec<u8>>,
    pub transient_map: BTreeMap<String, Vec<u8>>,
    pub init: bool,
}

impl Default for BuildProposalRequest {
    fn default() -> Self {
        Self {
            fcn: "invoke".to_string(),
            args: Vec::new(),
            transient_map: BTreeMap::new(),
            init: false,
        }
    }
}

impl BuildProposalRequest {
    pub fn new(fcn: impl Into<String>, args: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Self {
        Self {
            fcn: fcn.into(),
            args: args.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Where a proposal is sent.
pub enum Targets<H: ?Sized> {
    Peers(Vec<Arc<Peer>>),
    Handler(Arc<H>),
}

pub struct Proposal {
    kind: ProposalKind,
    chaincode_id: String,
    channel_name: String,
    state: ActionState,
    tx: Option<TransactionId>,
    proposal: Option<ChaincodeProposal>,
    collections_interest: Vec<String>,
    no_private_reads: bool,
    chaincodes_interest: Vec<ChaincodeCall>,
    results: Option<ProposalResults>,
}

impl Proposal {
    pub fn new(
        kind: ProposalKind,
        chaincode_id: impl Into<String>,
        channel_name: impl Into<String>,
    ) -> Result<Self, ActionError> {
        let chaincode_id = chaincode_id.into();
        let channel_name = channel_name.into();
        if chaincode_id.is_empty() {
            return Err(ActionError::MissingParameter("chaincodeId"));
        }
        if channel_name.is_empty() {
            return Err(ActionError::MissingParameter("channel"));
        }
        Ok(Self {
            kind,
            chaincode_id,
            channel_name,
            state: ActionState::default(),
            tx: None,
            proposal: None,
            collections_interest: Vec::new(),
            no_private_reads: false,
            chaincodes_interest: Vec::new(),
            results: None,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ProposalKind {
        self.kind
    }

    #[must_use]
    pub fn chaincode_id(&self) -> &str {
        &self.chaincode_id
    }

    #[must_use]
    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Transaction id assigned by the last `build`.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.tx.as_ref().map(|tx| tx.tx_id.as_str())
    }

    /// Results of the last `send`.
    #[must_use]
    pub fn results(&self) -> Option<&ProposalResults> {
        self.results.as_ref()
    }

    pub(crate) fn built_proposal(&self) -> Option<&ChaincodeProposal> {
        self.proposal.as_ref()
    }

    /// Build the proposal for signing. Returns the payload bytes.
    pub fn build(
        &mut self,
        identity: &dyn IdentityContext,
        request: BuildProposalRequest,
    ) -> Result<Vec<u8>, ActionError> {
        let tx = identity.calculate_transaction_id()?;

        let chaincode_id = ChaincodeId::named(self.chaincode_id.clone());
        let extension = encode(
            "ChaincodeHeaderExtension",
            &ChaincodeHeaderExtension {
                chaincode_id: chaincode_id.clone(),
            },
        )?;
        let channel_header = channel_header(
            HeaderType::EndorserTransaction,
            &self.channel_name,
            &tx.tx_id,
            extension,
            identity.client_cert_hash(),
        );
        let header = header(identity, &channel_header, &tx)?;

        let mut args = Vec::with_capacity(request.args.len() + 1);
        args.push(request.fcn.into_bytes());
        args.extend(request.args);
        let invocation = ChaincodeInvocationSpec {
            chaincode_spec: ChaincodeSpec {
                chaincode_id,
                input: ChaincodeInput {
                    args,
                    decorations: BTreeMap::new(),
                    is_init: request.init,
                },
            },
        };
        let payload = ChaincodeProposalPayload {
            input: encode("ChaincodeInvocationSpec", &invocation)?,
            transient_map: request.transient_map,
        };
        let proposal = ChaincodeProposal {
            header: encode("Header", &header)?,
            payload: encode("ChaincodeProposalPayload", &payload)?,
            extension: Vec::new(),
        };
        let bytes = encode("ChaincodeProposal", &proposal)?;

        debug!(chaincode = %self.chaincode_id, tx_id = %tx.tx_id, "proposal built");
        self.state.set_payload(bytes.clone());
        self.proposal = Some(proposal);
        self.tx = Some(tx);
        self.results = None;
        Ok(bytes)
    }

    /// The signed proposal as sent to endorsers.
    pub fn signed_proposal(&self) -> Result<SignedProposal, ActionError> {
        let envelope = self.signed_envelope()?;
        Ok(SignedProposal {
            proposal_bytes: envelope.payload,
            signature: envelope.signature,
        })
    }

    /// Declare a private data collection the invocation touches.
    pub fn add_collection_interest(&mut self, collection: impl Into<String>) {
        self.collections_interest.push(collection.into());
    }

    /// Declare that private data is written but never read.
    pub fn set_no_private_reads(&mut self, no_private_reads: bool) {
        self.no_private_reads = no_private_reads;
    }

    /// Declare a chaincode this invocation calls into.
    pub fn add_chaincode_interest(&mut self, chaincode: impl Into<String>, collections: Vec<String>) {
        self.chaincodes_interest.push(ChaincodeCall {
            name: chaincode.into(),
            collection_names: collections,
            no_private_reads: false,
        });
    }

    /// The chaincodes (and collections) whose policies must be satisfied.
    #[must_use]
    pub fn build_proposal_interest(&self) -> ChaincodeInterest {
        let mut chaincodes = vec![ChaincodeCall {
            name: self.chaincode_id.clone(),
            collection_names: self.collections_interest.clone(),
            no_private_reads: self.no_private_reads,
        }];
        chaincodes.extend(self.chaincodes_interest.iter().cloned());
        ChaincodeInterest { chaincodes }
    }

    /// Send the signed proposal to every peer concurrently and wait for all
    /// of them to settle.
    pub async fn send_to_targets(
        &self,
        targets: &[Arc<Peer>],
        request_timeout: Option<Duration>,
    ) -> Result<Vec<PeerOutcome>, ActionError> {
        if targets.is_empty() {
            return Err(ActionError::MissingParameter("targets"));
        }
        let signed = self.signed_proposal()?;
        let sends = targets.iter().map(|peer| {
            let signed = &signed;
            async move {
                let result = peer.send_proposal(signed, request_timeout).await;
                if let Err(e) = &result {
                    warn!(peer = %peer.name(), error = %e, "proposal failed");
                }
                PeerOutcome::new(peer, result)
            }
        });
        Ok(join_all(sends).await)
    }

    fn record(&mut self, results: ProposalResults) -> ProposalResults {
        debug!(
            chaincode = %self.chaincode_id,
            responses = results.responses.len(),
            errors = results.errors.len(),
            "proposal results"
        );
        self.results = Some(results.clone());
        results
    }
}

impl Signable for Proposal {
    const ACTION: &'static str = "Proposal";

    fn state(&self) -> &ActionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.state
    }
}

// =============================================================================
// Endorsement
// =============================================================================

/// A proposal whose endorsements feed a commit.
pub struct Endorsement(Proposal);

impl Endorsement {
    pub fn new(chaincode_id: impl Into<String>, channel_name: impl Into<String>) -> Result<Self, ActionError> {
        Proposal::new(ProposalKind::Endorsement, chaincode_id, channel_name).map(Self)
    }

    /// Send to explicit peers or through an endorsement handler.
    ///
    /// Without an interest in `request`, the handler is given this
    /// proposal's own interest.
    pub async fn send(
        &mut self,
        targets: Targets<dyn EndorseHandler>,
        request: &EndorseRequest,
    ) -> Result<ProposalResults, ActionError> {
        let results = match targets {
            Targets::Handler(handler) => {
                let signed = self.signed_proposal()?;
                let mut request = request.clone();
                if request.interest.is_none() {
                    request.interest = Some(self.build_proposal_interest());
                }
                handler.endorse(&signed, &request).await?
            }
            Targets::Peers(peers) => ProposalResults::from_outcomes(
                self.send_to_targets(&peers, request.request_timeout).await?,
            ),
        };
        Ok(self.0.record(results))
    }

    /// A commit carrying this endorsement's successful responses.
    pub fn new_commit(&self) -> Result<Commit, ActionError> {
        let proposal = self
            .built_proposal()
            .ok_or(ActionError::NotBuilt(Proposal::ACTION))?;
        let responses: Vec<_> = self
            .results()
            .map(|r| r.responses.iter().map(|p| p.response.clone()).collect())
            .unwrap_or_default();
        Ok(Commit::new(
            self.chaincode_id(),
            self.channel_name(),
            proposal.clone(),
            responses,
        ))
    }
}

impl Deref for Endorsement {
    type Target = Proposal;

    fn deref(&self) -> &Proposal {
        &self.0
    }
}

impl DerefMut for Endorsement {
    fn deref_mut(&mut self) -> &mut Proposal {
        &mut self.0
    }
}

// =============================================================================
// Query
// =============================================================================

/// A read-only proposal; results are never committed.
pub struct Query(Proposal);

impl Query {
    pub fn new(chaincode_id: impl Into<String>, channel_name: impl Into<String>) -> Result<Self, ActionError> {
        Proposal::new(ProposalKind::Query, chaincode_id, channel_name).map(Self)
    }

    /// Send to explicit peers or through a query handler.
    pub async fn send(
        &mut self,
        targets: Targets<dyn QueryHandler>,
        request_timeout: Option<Duration>,
    ) -> Result<ProposalResults, ActionError> {
        let outcomes = match targets {
            Targets::Handler(handler) => {
                let signed = self.signed_proposal()?;
                handler.query(&signed, request_timeout).await?
            }
            Targets::Peers(peers) => self.send_to_targets(&peers, request_timeout).await?,
        };
        Ok(self.0.record(ProposalResults::from_outcomes(outcomes)))
    }

    /// Payloads of status-200 responses from the last `send`.
    #[must_use]
    pub fn query_results(&self) -> Vec<Vec<u8>> {
        self.results().map(ProposalResults::query_results).unwrap_or_default()
    }
}

impl Deref for Query {
    type Target = Proposal;

    fn deref(&self) -> &Proposal {
        &self.0
    }
}

impl DerefMut for Query {
    fn deref_mut(&mut self) -> &mut Proposal {
        &mut self.0
    }
}
