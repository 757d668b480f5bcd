//! # Discovery Query Handler
//!
//! Fans a query out to every peer discovery has added to the channel.

use super::discovery::ChannelDiscovery;
use async_trait::async_trait;
use fc_02_service_action::{ActionError, PeerOutcome, QueryHandler};
use futures::future::join_all;
use shared_types::peer::SignedProposal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct DiscoveryQueryHandler {
    discovery: Arc<ChannelDiscovery>,
}

impl DiscoveryQueryHandler {
    pub(crate) fn new(discovery: Arc<ChannelDiscovery>) -> Self {
        Self { discovery }
    }
}

#[async_trait]
impl QueryHandler for DiscoveryQueryHandler {
    async fn query(
        &self,
        proposal: &SignedProposal,
        request_timeout: Option<Duration>,
    ) -> Result<Vec<PeerOutcome>, ActionError> {
        self.discovery.get_discovery_results(true).await?;
        let peers = self.discovery.channel().get_endorsers(None);
        if peers.is_empty() {
            return Err(ActionError::Discovery(
                "No peers assigned to the channel".to_string(),
            ));
        }
        debug!(channel = %self.discovery.channel().name(), peers = peers.len(), "querying discovered peers");

        Ok(join_all(peers.iter().map(|peer| async move {
            PeerOutcome::new(peer, peer.send_proposal(proposal, request_timeout).await)
        }))
        .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiscoveryConfig;
    use crate::service::request::BuildDiscoveryRequest;
    use crate::service::testing::Network;
    use fc_01_endpoint::MockEndorser;
    use fc_02_service_action::{BuildProposalRequest, Query, Signable, Targets};
    use shared_types::discovery::{DiscoveryResponse, QueryResult};
    use shared_types::test_utils::{discovery_peer, members};

    #[tokio::test]
    async fn test_fans_out_to_all_channel_peers() {
        let network = Network::new(
            DiscoveryResponse {
                results: vec![QueryResult::Members(members(&[
                    ("Org1MSP", discovery_peer("Org1MSP", "peer0.org1:7051", 3, &["mycc"])),
                    ("Org2MSP", discovery_peer("Org2MSP", "peer0.org2:9051", 3, &["mycc"])),
                ]))],
            },
            DiscoveryConfig::default(),
        );
        let p1 = network.endorser("peer0.org1:7051", MockEndorser::succeeding(b"42"));
        let p2 = network.endorser("peer0.org2:9051", MockEndorser::failing("unavailable"));
        network
            .discover(BuildDiscoveryRequest::default())
            .await
            .unwrap();

        let mut query = Query::new("mycc", "mychannel").unwrap();
        query
            .build(&network.identity, BuildProposalRequest::new("query", ["a"]))
            .unwrap();
        query.sign(&network.identity).unwrap();
        let results = query
            .send(Targets::Handler(network.discovery.query_handler()), None)
            .await
            .unwrap();

        assert_eq!(results.responses.len(), 1);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].peer, "peer0.org2:9051");
        assert_eq!(query.query_results(), vec![b"42".to_vec()]);
        assert_eq!((p1.calls(), p2.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_requires_peers() {
        let network = Network::new(DiscoveryResponse::default(), DiscoveryConfig::default());
        network
            .discover(BuildDiscoveryRequest::default())
            .await
            .unwrap();
        let err = network
            .discovery
            .query_handler()
            .query(&SignedProposal::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Discovery("No peers assigned to the channel".into()));
    }
}
