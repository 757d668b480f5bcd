//! # Orderer
//!
//! Ordering service node accepting signed transaction envelopes.

use super::service_endpoint::{HasEndpoint, ServiceEndpoint};
use crate::domain::{Endpoint, ServiceError};
use crate::ports::{BroadcastClient, Connector};
use shared_types::{BroadcastResponse, Envelope};
use std::time::Duration;
use tracing::debug;

pub struct Orderer {
    broadcast: ServiceEndpoint<dyn BroadcastClient>,
}

impl Orderer {
    pub fn new(name: impl Into<String>, mspid: Option<String>) -> Self {
        Self {
            broadcast: ServiceEndpoint::new(name, "Broadcast", mspid),
        }
    }

    pub async fn connect(
        &self,
        endpoint: Endpoint,
        connector: &dyn Connector<dyn BroadcastClient>,
    ) -> Result<(), ServiceError> {
        self.broadcast.connect(endpoint, connector).await
    }

    #[must_use]
    pub fn mspid(&self) -> Option<&str> {
        self.broadcast.mspid()
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.broadcast.endpoint()
    }

    /// Broadcast a signed envelope. The orderer's status is returned as is.
    pub async fn send_broadcast(
        &self,
        envelope: &Envelope,
        timeout: Option<Duration>,
    ) -> Result<BroadcastResponse, ServiceError> {
        debug!(orderer = %self.broadcast.name(), "sendBroadcast");
        let envelope = envelope.clone();
        self.broadcast
            .call("sendBroadcast", timeout, |client| async move {
                client.broadcast(envelope).await
            })
            .await
    }
}

impl HasEndpoint for Orderer {
    type Client = dyn BroadcastClient;

    fn service_endpoint(&self) -> &ServiceEndpoint<dyn BroadcastClient> {
        &self.broadcast
    }
}

impl std::fmt::Debug for Orderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orderer")
            .field("name", &self.broadcast.name())
            .field("mspid", &self.mspid())
            .field("connected", &self.broadcast.is_connected())
            .finish()
    }
}
