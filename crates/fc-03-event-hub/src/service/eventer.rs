//! # Eventer
//!
//! Event source: the delivery service of one peer.

use fc_01_endpoint::{
    Connectable, Connector, DeliverClient, DeliverStream, Endpoint, HasEndpoint, ServiceEndpoint,
    ServiceError,
};
use parking_lot::RwLock;
use shared_types::{BlockType, Envelope};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct Eventer {
    deliver: ServiceEndpoint<dyn DeliverClient>,
    connector: RwLock<Option<Arc<dyn Connector<dyn DeliverClient>>>>,
}

impl Eventer {
    pub fn new(name: impl Into<String>, mspid: Option<String>) -> Self {
        Self {
            deliver: ServiceEndpoint::new(name, "Eventer", mspid),
            connector: RwLock::new(None),
        }
    }

    /// Connect and remember how, so a hub can reconnect after shutdown.
    pub async fn connect(
        &self,
        endpoint: Endpoint,
        connector: Arc<dyn Connector<dyn DeliverClient>>,
    ) -> Result<(), ServiceError> {
        *self.connector.write() = Some(connector.clone());
        self.deliver.connect(endpoint, connector.as_ref()).await
    }

    /// Reconnect with the last endpoint if a shutdown disconnected us.
    pub async fn ensure_connected(&self) -> Result<(), ServiceError> {
        if self.deliver.is_connected() {
            return Ok(());
        }
        let connector = self.connector.read().clone();
        match (self.deliver.endpoint(), connector) {
            (Some(endpoint), Some(connector)) => {
                debug!(eventer = %self.deliver.name(), "reconnecting");
                self.deliver.connect(endpoint, connector.as_ref()).await
            }
            _ => Err(ServiceError::NotConnected {
                connection: self.deliver.connection_info(),
            }),
        }
    }

    #[must_use]
    pub fn mspid(&self) -> Option<&str> {
        self.deliver.mspid()
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.deliver.endpoint()
    }

    #[must_use]
    pub fn request_timeout(&self, timeout: Option<Duration>) -> Duration {
        self.deliver.request_timeout(timeout)
    }

    /// Open a delivery stream with a signed seek envelope.
    pub async fn open_stream(
        &self,
        block_type: BlockType,
        envelope: &Envelope,
        timeout: Option<Duration>,
    ) -> Result<DeliverStream, ServiceError> {
        debug!(eventer = %self.deliver.name(), %block_type, "opening delivery stream");
        let envelope = envelope.clone();
        self.deliver
            .call("deliver", timeout, |client| async move {
                client.deliver(block_type, envelope).await
            })
            .await
    }
}

impl HasEndpoint for Eventer {
    type Client = dyn DeliverClient;

    fn service_endpoint(&self) -> &ServiceEndpoint<dyn DeliverClient> {
        &self.deliver
    }
}

impl std::fmt::Debug for Eventer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Eventer")
            .field("name", &self.name())
            .field("connected", &self.is_connected())
            .finish()
    }
}
