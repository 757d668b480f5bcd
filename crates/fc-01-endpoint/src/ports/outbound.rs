//! # Outbound Ports
//!
//! One trait per remote service, plus the [`Connector`] that opens a
//! service client for an [`Endpoint`].
//!
//! ```text
//! Connector<dyn EndorserClient>  ── connect(endpoint) ──> Arc<dyn EndorserClient>
//! Connector<dyn BroadcastClient> ── connect(endpoint) ──> Arc<dyn BroadcastClient>
//! Connector<dyn DeliverClient>   ── connect(endpoint) ──> Arc<dyn DeliverClient>
//! Connector<dyn DiscoveryClient> ── connect(endpoint) ──> Arc<dyn DiscoveryClient>
//! ```

use crate::domain::{Endpoint, TransportError};
use async_trait::async_trait;
use futures::Stream;
use shared_types::discovery::{DiscoveryResponse, SignedRequest};
use shared_types::peer::{ProposalResponse, SignedProposal};
use shared_types::{BlockType, BroadcastResponse, DeliverResponse, Envelope};
use std::pin::Pin;
use std::sync::Arc;

/// Lifecycle shared by every service client.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Resolve once the underlying channel can carry requests.
    async fn wait_for_ready(&self) -> Result<(), TransportError>;

    /// Release the underlying channel.
    fn close(&self);
}

/// Endorser service of a peer.
#[async_trait]
pub trait EndorserClient: RemoteService {
    async fn process_proposal(
        &self,
        proposal: SignedProposal,
    ) -> Result<ProposalResponse, TransportError>;
}

/// Atomic broadcast service of an orderer.
#[async_trait]
pub trait BroadcastClient: RemoteService {
    async fn broadcast(&self, envelope: Envelope) -> Result<BroadcastResponse, TransportError>;
}

/// One observation on a delivery stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Data(DeliverResponse),
    /// The remote closed the stream.
    End,
    Error(TransportError),
}

/// Inbound side of a delivery stream. Dropping it cancels the stream.
pub type DeliverStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Block delivery service of a peer.
#[async_trait]
pub trait DeliverClient: RemoteService {
    /// Open a stream of `block_type` and send the signed seek envelope on it.
    async fn deliver(
        &self,
        block_type: BlockType,
        envelope: Envelope,
    ) -> Result<DeliverStream, TransportError>;
}

/// Discovery service of a peer.
#[async_trait]
pub trait DiscoveryClient: RemoteService {
    async fn discover(&self, request: SignedRequest) -> Result<DiscoveryResponse, TransportError>;
}

/// Opens a service client of type `C` for an endpoint.
#[async_trait]
pub trait Connector<C: ?Sized + RemoteService>: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<C>, TransportError>;
}

/// The connectors a client needs, one per service kind.
#[derive(Clone)]
pub struct Connectors {
    pub endorser: Arc<dyn Connector<dyn EndorserClient>>,
    pub broadcast: Arc<dyn Connector<dyn BroadcastClient>>,
    pub deliver: Arc<dyn Connector<dyn DeliverClient>>,
    pub discovery: Arc<dyn Connector<dyn DiscoveryClient>>,
}
