//! # Discoverer
//!
//! Discovery service of one peer.

use fc_01_endpoint::{
    Connectable, Connector, DiscoveryClient, Endpoint, HasEndpoint, ServiceEndpoint, ServiceError,
};
use shared_types::discovery::{DiscoveryResponse, SignedRequest};
use std::time::Duration;
use tracing::debug;

pub struct Discoverer {
    discovery: ServiceEndpoint<dyn DiscoveryClient>,
}

impl Discoverer {
    pub fn new(name: impl Into<String>, mspid: Option<String>) -> Self {
        Self {
            discovery: ServiceEndpoint::new(name, "Discovery", mspid),
        }
    }

    pub async fn connect(
        &self,
        endpoint: Endpoint,
        connector: &dyn Connector<dyn DiscoveryClient>,
    ) -> Result<(), ServiceError> {
        self.discovery.connect(endpoint, connector).await
    }

    #[must_use]
    pub fn mspid(&self) -> Option<&str> {
        self.discovery.mspid()
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.discovery.endpoint()
    }

    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.discovery.is_tls()
    }

    /// Send a signed discovery request; `timeout` overrides the endpoint
    /// default.
    pub async fn send_discovery(
        &self,
        request: &SignedRequest,
        timeout: Option<Duration>,
    ) -> Result<DiscoveryResponse, ServiceError> {
        debug!(discoverer = %self.discovery.name(), "sendDiscovery");
        let request = request.clone();
        self.discovery
            .call("sendDiscovery", timeout, |client| async move {
                client.discover(request).await
            })
            .await
    }
}

impl HasEndpoint for Discoverer {
    type Client = dyn DiscoveryClient;

    fn service_endpoint(&self) -> &ServiceEndpoint<dyn DiscoveryClient> {
        &self.discovery
    }
}

impl std::fmt::Debug for Discoverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discoverer")
            .field("name", &self.name())
            .field("connected", &self.is_connected())
            .finish()
    }
}
