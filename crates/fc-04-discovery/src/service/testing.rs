//! Mock network shared by the service tests.

use super::discoverer::Discoverer;
use super::discovery::{ChannelDiscovery, DiscoverRequest};
use super::request::BuildDiscoveryRequest;
use crate::domain::{DiscoveryConfig, DiscoveryError, DiscoveryResults};
use fc_01_endpoint::{
    BroadcastClient, Channel, Connectable, Connectors, DeliverClient, DiscoveryClient,
    EndorserClient, Endpoint, MockBroadcast, MockConnector, MockDiscovery, MockEndorser,
};
use shared_crypto::EcdsaIdentity;
use shared_types::discovery::DiscoveryResponse;
use std::sync::Arc;

pub(crate) struct Network {
    pub identity: EcdsaIdentity,
    pub service: Arc<MockDiscovery>,
    pub discoverer: Arc<Discoverer>,
    pub discovery: Arc<ChannelDiscovery>,
    pub endorsers: Arc<MockConnector<dyn EndorserClient>>,
    pub broadcast: Arc<MockConnector<dyn BroadcastClient>>,
    discovery_connector: Arc<MockConnector<dyn DiscoveryClient>>,
}

impl Network {
    pub fn new(response: DiscoveryResponse, config: DiscoveryConfig) -> Self {
        let service = Arc::new(MockDiscovery::new(response));
        let discovery_connector = Arc::new(MockConnector::<dyn DiscoveryClient>::new());
        discovery_connector.insert("peer0.org1:7051", service.clone());
        let endorsers = Arc::new(MockConnector::<dyn EndorserClient>::new());
        let broadcast = Arc::new(MockConnector::<dyn BroadcastClient>::new());
        let connectors = Connectors {
            endorser: endorsers.clone(),
            broadcast: broadcast.clone(),
            deliver: Arc::new(MockConnector::<dyn DeliverClient>::new()),
            discovery: discovery_connector.clone(),
        };
        let channel = Arc::new(Channel::new("mychannel").unwrap());
        Self {
            identity: EcdsaIdentity::generate("Org1MSP").unwrap(),
            service,
            discoverer: Arc::new(Discoverer::new("peer0.org1:7051", Some("Org1MSP".into()))),
            discovery: Arc::new(ChannelDiscovery::new("mychannel", channel, &connectors, config)),
            endorsers,
            broadcast,
            discovery_connector,
        }
    }

    pub fn endorser(&self, addr: &str, mock: MockEndorser) -> Arc<MockEndorser> {
        let mock = Arc::new(mock);
        self.endorsers.insert(addr, mock.clone());
        mock
    }

    pub fn orderer(&self, addr: &str, mock: MockBroadcast) -> Arc<MockBroadcast> {
        let mock = Arc::new(mock);
        self.broadcast.insert(addr, mock.clone());
        mock
    }

    pub fn orderer_succeeding(&self, addr: &str) -> Arc<MockBroadcast> {
        self.orderer(addr, MockBroadcast::succeeding())
    }

    /// Build, sign and send through the discoverer.
    pub async fn discover(
        &self,
        request: BuildDiscoveryRequest,
    ) -> Result<Arc<DiscoveryResults>, DiscoveryError> {
        if !self.discoverer.is_connected() {
            self.discoverer
                .connect(
                    Endpoint::parse("grpc://peer0.org1:7051").unwrap(),
                    self.discovery_connector.as_ref(),
                )
                .await
                .unwrap();
        }
        self.discovery.build(&self.identity, &request)?;
        self.discovery.sign(&self.identity)?;
        self.discovery
            .send(DiscoverRequest::new(vec![self.discoverer.clone()]))
            .await
    }
}
