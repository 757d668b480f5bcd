//! # Discovery Endorse Handler
//!
//! Satisfies the cached endorsement plan one layout at a time:
//!
//! ```text
//! for layout in plan.layouts (discovery order):
//!     for (group, required) in layout:
//!         endorsed = group peers already endorsed (any earlier attempt)
//!         while endorsed < required:
//!             send to the next (required - endorsed) untried peers, concurrently
//!             none left untried → layout unsatisfied, next layout
//!     all groups satisfied → responses of the selected peers + every failure
//! ```
//!
//! A peer is asked at most once per call; its outcome is reused by later
//! layouts.

use super::discovery::ChannelDiscovery;
use crate::domain::{DiscoveredPeer, EndorsementPlan};
use async_trait::async_trait;
use fc_01_endpoint::ServiceError;
use fc_02_service_action::domain::results::ERROR_STATUS;
use fc_02_service_action::{
    ActionError, EndorseHandler, EndorseRequest, PeerOutcome, PeerSort, ProposalResults,
};
use futures::future::join_all;
use rand::seq::SliceRandom;
use shared_types::peer::SignedProposal;
use shared_types::ConnectionInfo;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct DiscoveryEndorseHandler {
    discovery: Arc<ChannelDiscovery>,
}

impl DiscoveryEndorseHandler {
    pub(crate) fn new(discovery: Arc<ChannelDiscovery>) -> Self {
        Self { discovery }
    }

    async fn send_one(
        &self,
        peer: &DiscoveredPeer,
        proposal: &SignedProposal,
        timeout: Option<Duration>,
    ) -> PeerOutcome {
        match self.discovery.channel().get_endorser(&peer.name) {
            Some(client) => {
                let result = client.send_proposal(proposal, timeout).await;
                PeerOutcome::new(&client, result)
            }
            None => {
                let connection = ConnectionInfo::new(peer.name.clone(), "").with_mspid(peer.mspid.clone());
                PeerOutcome {
                    peer: peer.name.clone(),
                    connection: connection.clone(),
                    result: Err(ServiceError::NotConnected { connection }),
                }
            }
        }
    }

    /// Peers selected for `layout`, or `None` if it cannot be satisfied.
    async fn try_layout(
        &self,
        layout: &BTreeMap<String, u32>,
        groups: &BTreeMap<String, Vec<DiscoveredPeer>>,
        proposal: &SignedProposal,
        timeout: Option<Duration>,
        attempts: &mut Attempts,
    ) -> Option<Vec<String>> {
        let mut selected: Vec<String> = Vec::new();
        for (group, &required) in layout {
            let candidates = groups.get(group).map(Vec::as_slice).unwrap_or(&[]);
            let required = required as usize;
            loop {
                let endorsed: Vec<&str> = candidates
                    .iter()
                    .filter(|p| attempts.endorsed(&p.name))
                    .map(|p| p.name.as_str())
                    .take(required)
                    .collect();
                if endorsed.len() >= required {
                    for name in endorsed {
                        if !selected.iter().any(|s| s == name) {
                            selected.push(name.to_string());
                        }
                    }
                    break;
                }
                let batch: Vec<&DiscoveredPeer> = candidates
                    .iter()
                    .filter(|p| !attempts.tried(&p.name))
                    .take(required - endorsed.len())
                    .collect();
                if batch.is_empty() {
                    debug!(%group, required, endorsed = endorsed.len(), "group cannot be satisfied");
                    return None;
                }
                let outcomes = join_all(batch.iter().map(|p| self.send_one(p, proposal, timeout))).await;
                for outcome in outcomes {
                    attempts.record(outcome);
                }
            }
        }
        Some(selected)
    }
}

#[async_trait]
impl EndorseHandler for DiscoveryEndorseHandler {
    async fn endorse(
        &self,
        proposal: &SignedProposal,
        request: &EndorseRequest,
    ) -> Result<ProposalResults, ActionError> {
        let results = self.discovery.get_discovery_results(true).await?;
        let plan = results
            .endorsement_plan
            .as_ref()
            .ok_or_else(|| ActionError::Discovery("No endorsement plan available".to_string()))?;
        if let Some(chaincode) = request
            .interest
            .as_ref()
            .and_then(|i| i.chaincodes.first())
        {
            if chaincode.name != plan.chaincode {
                warn!(plan = %plan.chaincode, proposal = %chaincode.name, "endorsement plan was discovered for another chaincode");
            }
        }

        let groups = prepare_groups(plan, request);
        let mut attempts = Attempts::default();
        for (index, layout) in plan.layouts.iter().enumerate() {
            if let Some(selected) = self
                .try_layout(layout, &groups, proposal, request.request_timeout, &mut attempts)
                .await
            {
                info!(channel = %self.discovery.channel().name(), layout = index, peers = ?selected, "endorsement plan satisfied");
                return Ok(attempts.results(&selected));
            }
        }

        warn!(channel = %self.discovery.channel().name(), layouts = plan.layouts.len(), "no endorsement layout satisfied");
        Err(ActionError::EndorsementFailed {
            reason: "No endorsement plan layout could be satisfied".to_string(),
            failures: attempts.results(&[]).errors,
        })
    }
}

/// Outcomes of one `endorse` call, in the order peers were asked.
#[derive(Default)]
struct Attempts {
    order: Vec<String>,
    outcomes: HashMap<String, PeerOutcome>,
}

impl Attempts {
    fn record(&mut self, outcome: PeerOutcome) {
        if !self.outcomes.contains_key(&outcome.peer) {
            self.order.push(outcome.peer.clone());
        }
        self.outcomes.insert(outcome.peer.clone(), outcome);
    }

    fn tried(&self, peer: &str) -> bool {
        self.outcomes.contains_key(peer)
    }

    fn endorsed(&self, peer: &str) -> bool {
        self.outcomes
            .get(peer)
            .is_some_and(|o| matches!(&o.result, Ok(r) if r.response.status < ERROR_STATUS))
    }

    /// Responses of `selected` plus every failed attempt.
    fn results(&self, selected: &[String]) -> ProposalResults {
        let outcomes = self
            .order
            .iter()
            .filter(|peer| selected.contains(peer) || !self.endorsed(peer))
            .filter_map(|peer| self.outcomes.get(peer).cloned());
        ProposalResults::from_outcomes(outcomes)
    }
}

/// Apply the request's filters and ordering to every plan group.
///
/// Ignored orgs and peers are dropped. The rest are ordered by ledger
/// height (highest first) or shuffled, then preferred peers and orgs move
/// to the front. Peers lagging the group's highest ledger height by more
/// than the preferred height gap move behind all others.
pub(crate) fn prepare_groups(
    plan: &EndorsementPlan,
    request: &EndorseRequest,
) -> BTreeMap<String, Vec<DiscoveredPeer>> {
    let mut rng = rand::thread_rng();
    plan.groups
        .iter()
        .map(|(group, peers)| {
            let mut peers: Vec<DiscoveredPeer> = peers
                .iter()
                .filter(|p| !request.ignore_orgs.contains(&p.mspid) && !request.ignore_peers.contains(&p.name))
                .cloned()
                .collect();
            match request.sort {
                PeerSort::LedgerHeight => peers.sort_by(|a, b| b.ledger_height.cmp(&a.ledger_height)),
                PeerSort::Random => peers.shuffle(&mut rng),
            }

            let highest = peers.iter().filter_map(|p| p.ledger_height).max();
            let lagging = |p: &DiscoveredPeer| match (request.preferred_height_gap, highest, p.ledger_height) {
                (Some(gap), Some(highest), Some(height)) => height.value().saturating_add(gap) < highest.value(),
                _ => false,
            };
            let preferred = |p: &DiscoveredPeer| {
                request.preferred_peers.contains(&p.name) || request.preferred_orgs.contains(&p.mspid)
            };
            peers.sort_by_key(|p| (lagging(p), !preferred(p)));
            (group.clone(), peers)
        })
        .collect()
}
