//! # Discovery Commit Handler
//!
//! Broadcasts to the channel's discovered orderers, one at a time, until
//! one accepts. Orderers of the requested MSP are tried first; each
//! partition is shuffled so load spreads across equivalent orderers.

use super::discovery::ChannelDiscovery;
use async_trait::async_trait;
use fc_01_endpoint::Orderer;
use fc_02_service_action::{broadcast_first_success, ActionError, CommitHandler, CommitRequest};
use rand::seq::SliceRandom;
use shared_types::{BroadcastResponse, Envelope};
use std::sync::Arc;
use tracing::debug;

pub struct DiscoveryCommitHandler {
    discovery: Arc<ChannelDiscovery>,
}

impl DiscoveryCommitHandler {
    pub(crate) fn new(discovery: Arc<ChannelDiscovery>) -> Self {
        Self { discovery }
    }
}

#[async_trait]
impl CommitHandler for DiscoveryCommitHandler {
    async fn commit(
        &self,
        envelope: &Envelope,
        request: &CommitRequest,
    ) -> Result<BroadcastResponse, ActionError> {
        self.discovery.get_discovery_results(true).await?;
        let orderers = self.discovery.channel().get_committers(None);
        if orderers.is_empty() {
            return Err(ActionError::Discovery(
                "No orderers assigned to the channel".to_string(),
            ));
        }

        let ordered = commit_order(orderers, request.mspid.as_deref());
        debug!(
            channel = %self.discovery.channel().name(),
            orderers = ordered.len(),
            mspid = ?request.mspid,
            "committing through discovered orderers"
        );
        broadcast_first_success(&ordered, envelope, request.request_timeout).await
    }
}

/// Orderers of `mspid` first, then the rest; each part shuffled.
pub(crate) fn commit_order(orderers: Vec<Arc<Orderer>>, mspid: Option<&str>) -> Vec<Arc<Orderer>> {
    let (mut preferred, mut others): (Vec<_>, Vec<_>) = orderers
        .into_iter()
        .partition(|o| mspid.is_some() && o.mspid() == mspid);
    let mut rng = rand::thread_rng();
    preferred.shuffle(&mut rng);
    others.shuffle(&mut rng);
    preferred.extend(others);
    preferred
}
