//! # Peer
//!
//! Endorsing peer: sends proposals and carries the ledger height and
//! chaincodes last reported for it by discovery.

use super::service_endpoint::{HasEndpoint, ServiceEndpoint};
use crate::domain::{Endpoint, ServiceError};
use crate::ports::{Connector, EndorserClient};
use parking_lot::RwLock;
use shared_types::discovery::InstalledChaincode;
use shared_types::peer::{ProposalResponse, SignedProposal};
use shared_types::BlockNum;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct DiscoveredState {
    ledger_height: Option<BlockNum>,
    chaincodes: Vec<InstalledChaincode>,
}

pub struct Peer {
    endorser: ServiceEndpoint<dyn EndorserClient>,
    discovered: RwLock<DiscoveredState>,
}

impl Peer {
    pub fn new(name: impl Into<String>, mspid: Option<String>) -> Self {
        Self {
            endorser: ServiceEndpoint::new(name, "Endorser", mspid),
            discovered: RwLock::new(DiscoveredState::default()),
        }
    }

    pub async fn connect(
        &self,
        endpoint: Endpoint,
        connector: &dyn Connector<dyn EndorserClient>,
    ) -> Result<(), ServiceError> {
        self.endorser.connect(endpoint, connector).await
    }

    #[must_use]
    pub fn mspid(&self) -> Option<&str> {
        self.endorser.mspid()
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endorser.endpoint()
    }

    /// Send a signed proposal; `timeout` overrides the endpoint default.
    pub async fn send_proposal(
        &self,
        proposal: &SignedProposal,
        timeout: Option<Duration>,
    ) -> Result<ProposalResponse, ServiceError> {
        debug!(peer = %self.endorser.name(), "sendProposal");
        let proposal = proposal.clone();
        self.endorser
            .call("sendProposal", timeout, |client| async move {
                client.process_proposal(proposal).await
            })
            .await
    }

    /// Record the state discovery reported for this peer.
    pub fn set_discovered_state(&self, ledger_height: BlockNum, chaincodes: Vec<InstalledChaincode>) {
        let mut state = self.discovered.write();
        state.ledger_height = Some(ledger_height);
        state.chaincodes = chaincodes;
    }

    #[must_use]
    pub fn ledger_height(&self) -> Option<BlockNum> {
        self.discovered.read().ledger_height
    }

    #[must_use]
    pub fn chaincodes(&self) -> Vec<InstalledChaincode> {
        self.discovered.read().chaincodes.clone()
    }

    /// Whether discovery reported `chaincode` installed on this peer.
    #[must_use]
    pub fn has_chaincode(&self, chaincode: &str) -> bool {
        self.discovered
            .read()
            .chaincodes
            .iter()
            .any(|cc| cc.name == chaincode)
    }
}

impl HasEndpoint for Peer {
    type Client = dyn EndorserClient;

    fn service_endpoint(&self) -> &ServiceEndpoint<dyn EndorserClient> {
        &self.endorser
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("name", &self.endorser.name())
            .field("mspid", &self.mspid())
            .field("connected", &self.endorser.is_connected())
            .finish()
    }
}
