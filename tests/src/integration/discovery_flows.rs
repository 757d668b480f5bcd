//! # Discovery Flows
//!
//! Discovery-driven endorse, commit and query against mock peers and
//! orderers, with the channel populated from one discovery response.
//!
//! ```text
//! MockDiscovery ──→ ChannelDiscovery ──→ Channel (peers, orderers, MSPs)
//!                          │
//!                          ├── endorse_handler ──→ plan layouts
//!                          ├── commit_handler  ──→ orderers until SUCCESS
//!                          └── query_handler   ──→ every channel peer
//! ```

#[cfg(test)]
mod tests {
    use super::super::harness::{Harness, CHANNEL};
    use fc_01_endpoint::{MockBroadcast, MockEndorser, ServiceError};
    use fc_02_service_action::{
        ActionError, BuildProposalRequest, CommitRequest, CommitTargets, EndorseRequest,
        Endorsement, Query, Signable, Targets,
    };
    use fc_04_discovery::BuildDiscoveryRequest;
    use fc_client::ClientConfig;
    use shared_types::discovery::{DiscoveryResponse, QueryResult};
    use shared_types::test_utils::{config_result, discovery_peer, endorsement_plan, members};
    use shared_types::Status;
    use std::time::Duration;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    const ORDERERS: [(&str, &str, u16); 3] = [
        ("OrdererMSP", "orderer0", 7050),
        ("OrdererMSP", "orderer1", 7050),
        ("OrdererMSP", "orderer2", 7050),
    ];

    /// Config, membership and a two-layout plan for `mycc`: either both
    /// org1 peers, or one org1 peer plus the org2 peer.
    fn channel_response() -> DiscoveryResponse {
        let p1a = discovery_peer("Org1MSP", "peer0.org1:7051", 12, &["mycc"]);
        let p1b = discovery_peer("Org1MSP", "peer1.org1:7051", 11, &["mycc"]);
        let p2a = discovery_peer("Org2MSP", "peer0.org2:9051", 12, &["mycc"]);
        DiscoveryResponse {
            results: vec![
                QueryResult::ConfigResult(config_result(
                    &[("OrdererMSP", "TLSROOT"), ("Org1MSP", "TLSROOT"), ("Org2MSP", "TLSROOT")],
                    &ORDERERS,
                )),
                QueryResult::Members(members(&[
                    ("Org1MSP", p1a.clone()),
                    ("Org1MSP", p1b.clone()),
                    ("Org2MSP", p2a.clone()),
                ])),
                QueryResult::CcQueryRes(endorsement_plan(
                    "mycc",
                    &[("G1", vec![p1a, p1b]), ("G2", vec![p2a])],
                    &[&[("G1", 2)], &[("G1", 1), ("G2", 1)]],
                )),
            ],
        }
    }

    async fn endorsement(harness: &Harness) -> Endorsement {
        let mut endorsement = Endorsement::new("mycc", CHANNEL).unwrap();
        endorsement
            .build(harness.identity.as_ref(), BuildProposalRequest::new("move", ["a", "b", "10"]))
            .unwrap();
        endorsement.sign(harness.identity.as_ref()).unwrap();
        endorsement
    }

    // =========================================================================
    // RESULT CACHE
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_results_refresh_after_configured_age() {
        let mut config = ClientConfig::default();
        config.discovery.refresh_age_ms = 1_000;
        let harness = Harness::new(config);
        let service = harness.discovery_service(channel_response());
        let (discovery, first) = harness.discovered(BuildDiscoveryRequest::default()).await;
        assert_eq!(service.calls(), 1);

        tokio::time::advance(Duration::from_millis(500)).await;
        let cached = discovery.get_discovery_results(true).await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &cached));
        assert_eq!(service.calls(), 1);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        let refreshed = discovery.get_discovery_results(true).await.unwrap();
        assert_eq!(service.calls(), 2);
        assert!(!std::sync::Arc::ptr_eq(&first, &refreshed));
        assert!(refreshed.age() < Duration::from_millis(1_000));

        // Without refresh the cache is returned as is, however old.
        tokio::time::advance(Duration::from_millis(5_000)).await;
        discovery.get_discovery_results(false).await.unwrap();
        assert_eq!(service.calls(), 2);
    }

    #[tokio::test]
    async fn test_channel_populated_from_response() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        harness.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        harness.endorser("peer0.org2:9051", MockEndorser::succeeding(b"ok"));
        harness.orderer("orderer0:7050", MockBroadcast::succeeding());
        let (discovery, results) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let channel = discovery.channel();
        let mut msps = channel.msp_ids();
        msps.sort();
        assert_eq!(msps, vec!["OrdererMSP", "Org1MSP", "Org2MSP"]);
        // Unreachable nodes are reported but never added.
        assert_eq!(results.peers().count(), 3);
        assert_eq!(channel.get_endorsers(None).len(), 2);
        assert_eq!(channel.get_committers(None).len(), 1);
        assert_eq!(results.orderers["OrdererMSP"].len(), 3);
        assert!(results.endorsement_plan.is_some());
    }

    // =========================================================================
    // COMMIT
    // =========================================================================

    #[tokio::test]
    async fn test_commit_retries_until_an_orderer_accepts() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        let a = harness.orderer("orderer0:7050", MockBroadcast::rejecting(Status::ServiceUnavailable));
        let b = harness.orderer("orderer1:7050", MockBroadcast::rejecting(Status::BadRequest));
        let c = harness.orderer("orderer2:7050", MockBroadcast::succeeding());
        for addr in ["peer0.org1:7051", "peer1.org1:7051"] {
            harness.endorser(addr, MockEndorser::succeeding(b"ok"));
        }
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut endorsement = endorsement(&harness).await;
        endorsement
            .send(Targets::Handler(discovery.endorse_handler()), &EndorseRequest::default())
            .await
            .unwrap();

        let mut commit = endorsement.new_commit().unwrap();
        commit.build(harness.identity.as_ref()).unwrap();
        commit.sign(harness.identity.as_ref()).unwrap();
        let response = commit
            .send(CommitTargets::Handler(discovery.commit_handler()), &CommitRequest::default())
            .await
            .unwrap();

        assert!(response.status.is_success());
        assert_eq!(c.calls(), 1);
        assert!(a.calls() <= 1 && b.calls() <= 1);
    }

    #[tokio::test]
    async fn test_commit_with_every_orderer_rejecting() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        for (_, host, port) in ORDERERS {
            harness.orderer(&format!("{host}:{port}"), MockBroadcast::rejecting(Status::Forbidden));
        }
        harness.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        harness.endorser("peer1.org1:7051", MockEndorser::succeeding(b"ok"));
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut endorsement = endorsement(&harness).await;
        endorsement
            .send(Targets::Handler(discovery.endorse_handler()), &EndorseRequest::default())
            .await
            .unwrap();
        let mut commit = endorsement.new_commit().unwrap();
        commit.build(harness.identity.as_ref()).unwrap();
        commit.sign(harness.identity.as_ref()).unwrap();

        let err = commit
            .send(
                CommitTargets::Handler(discovery.commit_handler()),
                &CommitRequest {
                    mspid: Some("OrdererMSP".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::Service(ServiceError::Remote { ref status, .. }) if status == "FORBIDDEN"
        ));
    }

    // =========================================================================
    // QUERY
    // =========================================================================

    #[tokio::test]
    async fn test_query_fans_out_to_every_channel_peer() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        let p1 = harness.endorser("peer0.org1:7051", MockEndorser::succeeding(b"42"));
        let p2 = harness.endorser("peer0.org2:9051", MockEndorser::failing("chaincode crashed"));
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut query = Query::new("mycc", CHANNEL).unwrap();
        query
            .build(harness.identity.as_ref(), BuildProposalRequest::new("get", ["a"]))
            .unwrap();
        query.sign(harness.identity.as_ref()).unwrap();
        let results = query
            .send(Targets::Handler(discovery.query_handler()), Some(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(results.responses.len(), 1);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].peer, "peer0.org2:9051");
        assert_eq!(query.query_results(), vec![b"42".to_vec()]);
        assert_eq!((p1.calls(), p2.calls()), (1, 1));
    }

    // =========================================================================
    // ENDORSEMENT
    // =========================================================================

    #[tokio::test]
    async fn test_second_layout_when_org1_is_short_a_peer() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        let p1a = harness.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        let p1b = harness.endorser("peer1.org1:7051", MockEndorser::failing("unavailable"));
        let p2a = harness.endorser("peer0.org2:9051", MockEndorser::succeeding(b"ok"));
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut endorsement = endorsement(&harness).await;
        let results = endorsement
            .send(Targets::Handler(discovery.endorse_handler()), &EndorseRequest::default())
            .await
            .unwrap();

        let responders: Vec<_> = results.responses.iter().map(|r| r.peer.as_str()).collect();
        assert_eq!(responders, vec!["peer0.org1:7051", "peer0.org2:9051"]);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.errors[0].peer, "peer1.org1:7051");
        // Each peer is asked once across both layouts.
        assert_eq!((p1a.calls(), p1b.calls(), p2a.calls()), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_ignored_org_leaves_no_layout() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        harness.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        harness.endorser("peer1.org1:7051", MockEndorser::failing("unavailable"));
        let p2a = harness.endorser("peer0.org2:9051", MockEndorser::succeeding(b"ok"));
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut endorsement = endorsement(&harness).await;
        let err = endorsement
            .send(
                Targets::Handler(discovery.endorse_handler()),
                &EndorseRequest {
                    ignore_orgs: vec!["Org2MSP".into()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::EndorsementFailed { .. }), "{err}");
        assert_eq!(p2a.calls(), 0);
    }

    #[tokio::test]
    async fn test_endorse_then_commit_through_discovery() {
        let harness = Harness::new(ClientConfig::default());
        harness.discovery_service(channel_response());
        for addr in ["peer0.org1:7051", "peer1.org1:7051", "peer0.org2:9051"] {
            harness.endorser(addr, MockEndorser::succeeding(b"moved"));
        }
        let orderer = harness.orderer("orderer1:7050", MockBroadcast::succeeding());
        let (discovery, _) = harness.discovered(BuildDiscoveryRequest::default()).await;

        let mut endorsement = endorsement(&harness).await;
        let results = endorsement
            .send(Targets::Handler(discovery.endorse_handler()), &EndorseRequest::default())
            .await
            .unwrap();
        // The first layout is satisfied by org1 alone.
        assert_eq!(results.responses.len(), 2);
        assert!(results.compare_results());

        let mut commit = endorsement.new_commit().unwrap();
        commit.build(harness.identity.as_ref()).unwrap();
        commit.sign(harness.identity.as_ref()).unwrap();
        let response = commit
            .send(CommitTargets::Handler(discovery.commit_handler()), &CommitRequest::default())
            .await
            .unwrap();

        assert_eq!(response.status, Status::Success);
        assert_eq!(orderer.calls(), 1);
    }
}
