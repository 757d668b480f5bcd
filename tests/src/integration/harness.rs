//! # Test Harness
//!
//! A [`Client`] wired to in-memory transports. Every mock is registered
//! under its `host:port` address before the client connects to it.

use fc_01_endpoint::{
    BroadcastClient, Connectors, DeliverClient, DeliverFeed, DiscoveryClient, EndorserClient,
    MockBroadcast, MockConnector, MockDeliver, MockDiscovery, MockEndorser,
};
use fc_03_event_hub::{Delivery, EventHub, Eventer, SendRequest, StartRequest};
use fc_04_discovery::{BuildDiscoveryRequest, ChannelDiscovery, DiscoverRequest, DiscoveryResults};
use fc_client::{Client, ClientConfig};
use parking_lot::Mutex;
use shared_crypto::EcdsaIdentity;
use shared_types::discovery::DiscoveryResponse;
use std::sync::Arc;

pub const CHANNEL: &str = "mychannel";
pub const DISCOVERY_PEER: &str = "peer0.org1:7051";

pub struct Harness {
    pub identity: Arc<EcdsaIdentity>,
    pub client: Client,
    endorsers: Arc<MockConnector<dyn EndorserClient>>,
    broadcast: Arc<MockConnector<dyn BroadcastClient>>,
    deliver: Arc<MockConnector<dyn DeliverClient>>,
    discovery: Arc<MockConnector<dyn DiscoveryClient>>,
}

impl Harness {
    pub fn new(config: ClientConfig) -> Self {
        let endorsers = Arc::new(MockConnector::<dyn EndorserClient>::new());
        let broadcast = Arc::new(MockConnector::<dyn BroadcastClient>::new());
        let deliver = Arc::new(MockConnector::<dyn DeliverClient>::new());
        let discovery = Arc::new(MockConnector::<dyn DiscoveryClient>::new());
        let connectors = Connectors {
            endorser: endorsers.clone(),
            broadcast: broadcast.clone(),
            deliver: deliver.clone(),
            discovery: discovery.clone(),
        };
        let identity = Arc::new(EcdsaIdentity::generate("Org1MSP").unwrap());
        Self {
            client: Client::new(config, identity.clone(), connectors),
            identity,
            endorsers,
            broadcast,
            deliver,
            discovery,
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

    pub fn discovery_service(&self, response: DiscoveryResponse) -> Arc<MockDiscovery> {
        let mock = Arc::new(MockDiscovery::new(response));
        self.discovery.insert(DISCOVERY_PEER, mock.clone());
        mock
    }

    pub fn deliver_service(&self, addr: &str) -> Arc<MockDeliver> {
        let mock = Arc::new(MockDeliver::new());
        self.deliver.insert(addr, mock.clone());
        mock
    }

    pub async fn eventer(&self, addr: &str) -> Arc<Eventer> {
        self.client
            .eventer(addr, &format!("grpc://{addr}"), Some("Org1MSP".into()))
            .await
            .unwrap()
    }

    /// A hub with a signed seek request for `request`.
    pub fn hub(&self, request: StartRequest) -> EventHub {
        let hub = self.client.event_hub("hub", CHANNEL).unwrap();
        hub.build(self.identity.as_ref(), request).unwrap();
        hub.sign(self.identity.as_ref()).unwrap();
        hub
    }

    /// Start `hub` on `addr`; `first` is what the stream delivers first.
    pub async fn start(&self, hub: &EventHub, addr: &str, first: impl FnOnce(&DeliverFeed)) -> DeliverFeed {
        let service = self.deliver_service(addr);
        let feed = service.feed();
        first(&feed);
        hub.send(SendRequest::new(vec![self.eventer(addr).await]))
            .await
            .unwrap();
        feed
    }

    /// Channel discovery after one successful round-trip.
    pub async fn discovered(
        &self,
        request: BuildDiscoveryRequest,
    ) -> (Arc<ChannelDiscovery>, Arc<DiscoveryResults>) {
        let discoverer = self
            .client
            .discoverer(DISCOVERY_PEER, &format!("grpc://{DISCOVERY_PEER}"), Some("Org1MSP".into()))
            .await
            .unwrap();
        let discovery = self.client.channel_discovery("discovery", CHANNEL).unwrap();
        discovery.build(self.identity.as_ref(), &request).unwrap();
        discovery.sign(self.identity.as_ref()).unwrap();
        let results = discovery
            .send(DiscoverRequest::new(vec![discoverer]))
            .await
            .unwrap();
        (discovery, results)
    }
}

pub type Recorded = Arc<Mutex<Vec<Delivery>>>;

/// Callback that records every delivery.
pub fn recorder() -> (impl FnMut(Delivery) + Send + 'static, Recorded) {
    let seen: Recorded = Arc::default();
    let sink = seen.clone();
    (move |d: Delivery| sink.lock().push(d), seen)
}

/// Let spawned stream readers run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
