//! # Channel Discovery
//!
//! Asks discovery services about one channel, caches the answer and turns
//! discovered peers and orderers into connected clients on the channel.
//!
//! ```text
//! build ─> sign ─> send(targets) ──first answering target──> process
//!                                                              │
//!          ┌───────────────────────────────────────────────────┘
//!          ▼
//!   config_result  MSPs onto the channel, orderers connected + added
//!   members        peers connected + added (local peers only recorded)
//!   cc_query_res   plan group peers connected + added
//!          │
//!          ▼
//!   cache (replaced wholesale) ── get_discovery_results(refresh) ──> re-send
//!                                     when older than refresh age
//! ```

use super::commit::DiscoveryCommitHandler;
use super::discoverer::Discoverer;
use super::endorse::DiscoveryEndorseHandler;
use super::query::DiscoveryQueryHandler;
use super::request::{build_request, BuildDiscoveryRequest, QueryTag};
use crate::domain::{
    decode_config, decode_members, decode_plan, DiscoveredPeer, DiscoveryConfig, DiscoveryError,
    DiscoveryResults, OrdererAddress,
};
use fc_01_endpoint::{
    BroadcastClient, Channel, Connectable, Connector, Connectors, EndorserClient, Endpoint,
    MspInfo, Orderer, Peer, Protocol,
};
use fc_02_service_action::{ActionState, Signable};
use parking_lot::Mutex;
use shared_crypto::IdentityContext;
use shared_types::discovery::{DiscoveryResponse, QueryResult, SignedRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Targets and per-call overrides for `send`.
#[derive(Debug, Clone, Default)]
pub struct DiscoverRequest {
    pub targets: Vec<Arc<Discoverer>>,
    pub request_timeout: Option<Duration>,
    pub as_localhost: Option<bool>,
    pub refresh_age: Option<Duration>,
}

impl DiscoverRequest {
    pub fn new(targets: Vec<Arc<Discoverer>>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct SignedDiscovery {
    state: ActionState,
    tags: Vec<QueryTag>,
}

impl Signable for SignedDiscovery {
    const ACTION: &'static str = "Discovery";

    fn state(&self) -> &ActionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.state
    }
}

/// Settings of the last `send`, reused by refreshes.
#[derive(Debug, Clone)]
struct LastSend {
    targets: Vec<Arc<Discoverer>>,
    request_timeout: Option<Duration>,
    as_localhost: bool,
    refresh_age: Duration,
}

pub struct ChannelDiscovery {
    name: String,
    channel: Arc<Channel>,
    endorser: Arc<dyn Connector<dyn EndorserClient>>,
    broadcast: Arc<dyn Connector<dyn BroadcastClient>>,
    config: DiscoveryConfig,
    request: Mutex<SignedDiscovery>,
    last: Mutex<Option<LastSend>>,
    results: Mutex<Option<Arc<DiscoveryResults>>>,
    /// Serializes refreshes so concurrent handlers re-send once.
    refreshing: tokio::sync::Mutex<()>,
}

impl ChannelDiscovery {
    pub fn new(
        name: impl Into<String>,
        channel: Arc<Channel>,
        connectors: &Connectors,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            channel,
            endorser: connectors.endorser.clone(),
            broadcast: connectors.broadcast.clone(),
            config,
            request: Mutex::new(SignedDiscovery::default()),
            last: Mutex::new(None),
            results: Mutex::new(None),
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn channel(&self) -> &Arc<Channel> {
        &self.channel
    }

    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Build / sign
    // -------------------------------------------------------------------------

    pub fn build(
        &self,
        identity: &dyn IdentityContext,
        request: &BuildDiscoveryRequest,
    ) -> Result<Vec<u8>, DiscoveryError> {
        let built = build_request(identity, self.channel.name(), request)?;
        let mut signed = self.request.lock();
        signed.state.set_payload(built.payload.clone());
        signed.tags = built.tags;
        debug!(discovery = %self.name, queries = signed.tags.len(), "discovery request built");
        Ok(built.payload)
    }

    pub fn sign(&self, identity: &dyn IdentityContext) -> Result<(), DiscoveryError> {
        Ok(self.request.lock().sign(identity)?)
    }

    /// Attach a signature computed outside the client.
    pub fn sign_with(&self, signature: Vec<u8>) -> Result<(), DiscoveryError> {
        Ok(self.request.lock().sign_with(signature)?)
    }

    pub fn payload_bytes(&self) -> Result<Vec<u8>, DiscoveryError> {
        Ok(self.request.lock().payload_bytes()?)
    }

    // -------------------------------------------------------------------------
    // Send / cache
    // -------------------------------------------------------------------------

    /// Send the signed request to the targets in order and process the
    /// first answer. The result tree replaces the cache.
    pub async fn send(&self, request: DiscoverRequest) -> Result<Arc<DiscoveryResults>, DiscoveryError> {
        if request.targets.is_empty() {
            return Err(DiscoveryError::MissingParameter("targets"));
        }
        let (signed, tags) = {
            let discovery = self.request.lock();
            let envelope = discovery.signed_envelope()?;
            (
                SignedRequest {
                    payload: envelope.payload,
                    signature: envelope.signature,
                },
                discovery.tags.clone(),
            )
        };

        let settings = LastSend {
            targets: request.targets,
            request_timeout: request.request_timeout.or(self.config.request_timeout()),
            as_localhost: request.as_localhost.unwrap_or(self.config.as_localhost),
            refresh_age: request.refresh_age.unwrap_or(self.config.refresh_age()),
        };
        *self.last.lock() = Some(settings.clone());

        let mut last_error = None;
        for target in &settings.targets {
            match target.send_discovery(&signed, settings.request_timeout).await {
                Ok(response) => {
                    let results = Arc::new(
                        self.process(response, target, &tags, settings.as_localhost)
                            .await?,
                    );
                    *self.results.lock() = Some(results.clone());
                    info!(
                        discovery = %self.name,
                        target = %target.name(),
                        peers = results.peers().count(),
                        orderers = results.orderers.values().map(Vec::len).sum::<usize>(),
                        plan = results.endorsement_plan.is_some(),
                        "discovery results updated"
                    );
                    return Ok(results);
                }
                Err(e) => {
                    warn!(discovery = %self.name, target = %target.name(), error = %e, "discovery request failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.map_or(DiscoveryError::MissingParameter("targets"), Into::into))
    }

    /// The cached results. With `refresh`, results older than the refresh
    /// age are replaced first by re-sending with the last settings.
    pub async fn get_discovery_results(
        &self,
        refresh: bool,
    ) -> Result<Arc<DiscoveryResults>, DiscoveryError> {
        let cached = self.cached()?;
        if !refresh {
            return Ok(cached);
        }
        let last = self.last.lock().clone();
        let Some(last) = last else {
            return Ok(cached);
        };
        if !cached.is_stale(last.refresh_age) {
            return Ok(cached);
        }

        let _refreshing = self.refreshing.lock().await;
        let cached = self.cached()?;
        if !cached.is_stale(last.refresh_age) {
            return Ok(cached);
        }
        debug!(discovery = %self.name, age_ms = cached.age().as_millis(), "refreshing discovery results");
        self.send(DiscoverRequest {
            targets: last.targets,
            request_timeout: last.request_timeout,
            as_localhost: Some(last.as_localhost),
            refresh_age: Some(last.refresh_age),
        })
        .await
    }

    fn cached(&self) -> Result<Arc<DiscoveryResults>, DiscoveryError> {
        self.results.lock().clone().ok_or(DiscoveryError::NoResults)
    }

    #[must_use]
    pub fn has_results(&self) -> bool {
        self.results.lock().is_some()
    }

    // -------------------------------------------------------------------------
    // Handlers
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn endorse_handler(self: &Arc<Self>) -> Arc<DiscoveryEndorseHandler> {
        Arc::new(DiscoveryEndorseHandler::new(Arc::clone(self)))
    }

    #[must_use]
    pub fn commit_handler(self: &Arc<Self>) -> Arc<DiscoveryCommitHandler> {
        Arc::new(DiscoveryCommitHandler::new(Arc::clone(self)))
    }

    #[must_use]
    pub fn query_handler(self: &Arc<Self>) -> Arc<DiscoveryQueryHandler> {
        Arc::new(DiscoveryQueryHandler::new(Arc::clone(self)))
    }

    /// Disconnect the discovery targets of the last `send`.
    pub fn close(&self) {
        if let Some(last) = self.last.lock().as_ref() {
            for target in &last.targets {
                target.disconnect();
            }
        }
        debug!(discovery = %self.name, "discovery closed");
    }

    // -------------------------------------------------------------------------
    // Response processing
    // -------------------------------------------------------------------------

    async fn process(
        &self,
        response: DiscoveryResponse,
        target: &Discoverer,
        tags: &[QueryTag],
        as_localhost: bool,
    ) -> Result<DiscoveryResults, DiscoveryError> {
        let protocol = self.config.protocol.unwrap_or(if target.is_tls() {
            Protocol::Grpcs
        } else {
            Protocol::Grpc
        });
        let mut results = DiscoveryResults::empty(Instant::now());

        // Every entry decodes before the channel is touched, so a bad
        // response leaves it as it was.
        for (index, result) in response.results.into_iter().enumerate() {
            match result {
                QueryResult::Error { content } => return Err(DiscoveryError::Remote(content)),
                QueryResult::ConfigResult(config) => {
                    let (msps, orderers) = decode_config(&config);
                    results.msps = msps;
                    results.orderers = orderers;
                }
                QueryResult::Members(members) => {
                    if tags.get(index) == Some(&QueryTag::LocalPeers) {
                        results.local_peers = decode_members(&members, false)?;
                    } else {
                        results.peers_by_org = decode_members(&members, true)?;
                    }
                }
                QueryResult::CcQueryRes(query) => {
                    results.endorsement_plan = Some(decode_plan(&query)?);
                }
            }
        }

        for msp in results.msps.values() {
            self.channel.add_msp(msp.clone(), true)?;
        }
        for (mspid, addresses) in &results.orderers {
            for address in addresses {
                self.add_orderer(mspid, address, protocol, as_localhost).await;
            }
        }
        let plan_peers = results
            .endorsement_plan
            .iter()
            .flat_map(|plan| plan.groups.values().flatten());
        for peer in results.peers_by_org.values().flatten().chain(plan_peers) {
            self.add_peer(peer, protocol, as_localhost).await;
        }

        results.timestamp = Instant::now();
        Ok(results)
    }

    /// Connect a discovered peer and add it to the channel, once per
    /// address. Known peers only get their reported state updated.
    async fn add_peer(&self, discovered: &DiscoveredPeer, protocol: Protocol, as_localhost: bool) {
        let peer = match self.channel.get_endorser(&discovered.name) {
            Some(known) => known,
            None => {
                let endpoint = discovered_endpoint(
                    &discovered.host,
                    discovered.port,
                    protocol,
                    as_localhost,
                    self.channel.get_msp(&discovered.mspid).as_ref(),
                );
                let url = endpoint.url();
                let peer = Arc::new(Peer::new(discovered.name.clone(), Some(discovered.mspid.clone())));
                if let Err(e) = peer.connect(endpoint, self.endorser.as_ref()).await {
                    warn!(discovery = %self.name, peer = %discovered.name, %url, error = %e, "unable to connect to discovered peer");
                    return;
                }
                if let Err(e) = self.channel.add_endorser(peer.clone(), false) {
                    debug!(discovery = %self.name, peer = %discovered.name, error = %e, "peer already added");
                }
                peer
            }
        };
        if let Some(height) = discovered.ledger_height {
            peer.set_discovered_state(height, discovered.chaincodes.clone());
        }
    }

    async fn add_orderer(&self, mspid: &str, address: &OrdererAddress, protocol: Protocol, as_localhost: bool) {
        if self.channel.get_committer(&address.name).is_some() {
            return;
        }
        let endpoint = discovered_endpoint(
            &address.host,
            address.port,
            protocol,
            as_localhost,
            self.channel.get_msp(mspid).as_ref(),
        );
        let url = endpoint.url();
        let orderer = Arc::new(Orderer::new(address.name.clone(), Some(mspid.to_string())));
        if let Err(e) = orderer.connect(endpoint, self.broadcast.as_ref()).await {
            warn!(discovery = %self.name, orderer = %address.name, %url, error = %e, "unable to connect to discovered orderer");
            return;
        }
        if let Err(e) = self.channel.add_committer(orderer, false) {
            debug!(discovery = %self.name, orderer = %address.name, error = %e, "orderer already added");
        }
    }
}

impl std::fmt::Debug for ChannelDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDiscovery")
            .field("name", &self.name)
            .field("channel", &self.channel.name())
            .field("has_results", &self.has_results())
            .finish()
    }
}

/// Endpoint for a discovered `host:port`. With `as_localhost` the host
/// becomes `localhost` and the advertised host is kept as the TLS target
/// name. TLS endpoints trust the owning MSP's TLS roots.
pub fn discovered_endpoint(
    host: &str,
    port: u16,
    protocol: Protocol,
    as_localhost: bool,
    msp: Option<&MspInfo>,
) -> Endpoint {
    let mut endpoint = if as_localhost {
        Endpoint::new(protocol, "localhost", port).with_ssl_target_name_override(host)
    } else {
        Endpoint::new(protocol, host, port)
    };
    if protocol.is_tls() {
        let bundle = msp.map(MspInfo::tls_ca_bundle).unwrap_or_default();
        if !bundle.is_empty() {
            endpoint = endpoint.with_tls_root_certs(bundle.into_bytes());
        }
    }
    endpoint
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::Network;
    use fc_01_endpoint::MockEndorser;
    use shared_types::discovery::{ChaincodeInterest, QueryResult};
    use shared_types::test_utils::{
        config_result, discovery_peer, endorsement_plan, local_peer, members,
    };
    use shared_types::BlockNum;

    fn response() -> DiscoveryResponse {
        DiscoveryResponse {
            results: vec![
                QueryResult::ConfigResult(config_result(
                    &[("Org1MSP", "TLS1"), ("OrdererMSP", "TLSO")],
                    &[("OrdererMSP", "orderer0", 7050)],
                )),
                QueryResult::Members(members(&[
                    ("Org1MSP", discovery_peer("Org1MSP", "peer0.org1:7051", 10, &["mycc"])),
                    ("Org1MSP", discovery_peer("Org1MSP", "peer1.org1:7051", 8, &["mycc"])),
                ])),
            ],
        }
    }

    #[tokio::test]
    async fn test_send_materializes_channel() {
        let network = Network::new(response(), DiscoveryConfig::default());
        network.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        network.endorser("peer1.org1:7051", MockEndorser::succeeding(b"ok"));
        network.orderer_succeeding("orderer0:7050");

        let results = network.discover(BuildDiscoveryRequest::default()).await.unwrap();
        assert_eq!(results.msps.len(), 2);
        assert_eq!(results.peers().count(), 2);

        let channel = network.discovery.channel();
        assert_eq!(channel.get_endorsers(Some("Org1MSP")).len(), 2);
        assert_eq!(channel.get_committers(Some("OrdererMSP")).len(), 1);
        assert_eq!(channel.get_msp("Org1MSP").unwrap().tls_root_certs, vec!["TLS1".to_string()]);
        let peer = channel.get_endorser("peer0.org1:7051").unwrap();
        assert_eq!(peer.ledger_height(), Some(BlockNum::new(10)));
        assert!(peer.has_chaincode("mycc"));
    }

    #[tokio::test]
    async fn test_rediscovery_is_idempotent() {
        let network = Network::new(response(), DiscoveryConfig::default());
        network.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));
        network.endorser("peer1.org1:7051", MockEndorser::succeeding(b"ok"));
        network.orderer_succeeding("orderer0:7050");

        network.discover(BuildDiscoveryRequest::default()).await.unwrap();
        network
            .discovery
            .send(DiscoverRequest::new(vec![network.discoverer.clone()]))
            .await
            .unwrap();
        assert_eq!(network.discovery.channel().get_endorsers(None).len(), 2);
        assert_eq!(network.endorsers.connected().len(), 2);
        assert_eq!(network.broadcast.connected().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_peer_is_skipped() {
        let network = Network::new(response(), DiscoveryConfig::default());
        network.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));

        let results = network.discover(BuildDiscoveryRequest::default()).await.unwrap();
        assert_eq!(results.peers().count(), 2);
        assert_eq!(network.discovery.channel().get_endorsers(None).len(), 1);
        assert!(network.discovery.channel().get_committers(None).is_empty());
    }

    #[tokio::test]
    async fn test_error_result_aborts() {
        let network = Network::new(
            DiscoveryResponse {
                results: vec![QueryResult::Error {
                    content: "access denied".into(),
                }],
            },
            DiscoveryConfig::default(),
        );
        let err = network.discover(BuildDiscoveryRequest::default()).await.unwrap_err();
        assert_eq!(err, DiscoveryError::Remote("access denied".into()));
        assert!(matches!(
            network.discovery.get_discovery_results(false).await,
            Err(DiscoveryError::NoResults)
        ));
    }

    #[tokio::test]
    async fn test_invalid_members_leave_channel_untouched() {
        let network = Network::new(
            DiscoveryResponse {
                results: vec![
                    QueryResult::ConfigResult(config_result(
                        &[("Org1MSP", "TLS1"), ("OrdererMSP", "TLSO")],
                        &[("OrdererMSP", "orderer0", 7050)],
                    )),
                    // Channel members must carry state info.
                    QueryResult::Members(members(&[("Org1MSP", local_peer("Org1MSP", "peer0.org1:7051"))])),
                ],
            },
            DiscoveryConfig::default(),
        );
        network.orderer_succeeding("orderer0:7050");

        let err = network.discover(BuildDiscoveryRequest::default()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPeer { .. }));
        let channel = network.discovery.channel();
        assert!(channel.msp_ids().is_empty());
        assert!(channel.get_committers(None).is_empty());
        assert!(network.broadcast.connected().is_empty());
    }

    #[tokio::test]
    async fn test_plan_and_local_peers() {
        let network = Network::new(
            DiscoveryResponse {
                results: vec![
                    QueryResult::Members(members(&[(
                        "Org1MSP",
                        discovery_peer("Org1MSP", "peer0.org1:7051", 4, &["mycc"]),
                    )])),
                    QueryResult::CcQueryRes(endorsement_plan(
                        "mycc",
                        &[("G0", vec![discovery_peer("Org1MSP", "peer0.org1:7051", 4, &["mycc"])])],
                        &[&[("G0", 1)]],
                    )),
                    QueryResult::Members(members(&[("Org1MSP", local_peer("Org1MSP", "peer9.org1:7051"))])),
                ],
            },
            DiscoveryConfig::default(),
        );
        network.endorser("peer0.org1:7051", MockEndorser::succeeding(b"ok"));

        let request = BuildDiscoveryRequest {
            config: false,
            local: true,
            interest: vec![ChaincodeInterest::default()],
        };
        let results = network.discover(request).await.unwrap();
        assert_eq!(results.endorsement_plan.as_ref().unwrap().chaincode, "mycc");
        assert_eq!(results.local_peers["Org1MSP"][0].name, "peer9.org1:7051");
        assert!(network.discovery.channel().get_endorser("peer9.org1:7051").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_respects_age() {
        let config = DiscoveryConfig {
            refresh_age_ms: 1_000,
            ..DiscoveryConfig::default()
        };
        let network = Network::new(response(), config);
        network.discover(BuildDiscoveryRequest::default()).await.unwrap();
        assert_eq!(network.service.calls(), 1);

        tokio::time::advance(Duration::from_millis(500)).await;
        network.discovery.get_discovery_results(true).await.unwrap();
        assert_eq!(network.service.calls(), 1);

        tokio::time::advance(Duration::from_millis(1_000)).await;
        network.discovery.get_discovery_results(false).await.unwrap();
        assert_eq!(network.service.calls(), 1);
        network.discovery.get_discovery_results(true).await.unwrap();
        assert_eq!(network.service.calls(), 2);
    }

    #[tokio::test]
    async fn test_send_requires_signature_and_targets() {
        let network = Network::new(response(), DiscoveryConfig::default());
        assert!(matches!(
            network.discovery.send(DiscoverRequest::default()).await,
            Err(DiscoveryError::MissingParameter("targets"))
        ));
        network
            .discovery
            .build(&network.identity, &BuildDiscoveryRequest::default())
            .unwrap();
        assert!(matches!(
            network
                .discovery
                .send(DiscoverRequest::new(vec![network.discoverer.clone()]))
                .await,
            Err(DiscoveryError::Action(_))
        ));
    }

    #[test]
    fn test_discovered_endpoint() {
        let msp = MspInfo {
            id: "Org1MSP".into(),
            tls_root_certs: vec!["TLS1".into()],
            ..Default::default()
        };
        let endpoint = discovered_endpoint("peer0.org1", 7051, Protocol::Grpcs, true, Some(&msp));
        assert_eq!(endpoint.url(), "grpcs://localhost:7051");
        assert_eq!(endpoint.ssl_target_name_override.as_deref(), Some("peer0.org1"));
        assert_eq!(endpoint.tls_root_certs, b"TLS1".to_vec());

        let plain = discovered_endpoint("peer0.org1", 7051, Protocol::Grpc, false, Some(&msp));
        assert_eq!(plain.url(), "grpc://peer0.org1:7051");
        assert!(plain.tls_root_certs.is_empty());
    }
}
