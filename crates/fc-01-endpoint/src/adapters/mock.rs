//! # Mock Transports
//!
//! In-memory implementations of every outbound port, for tests.

use crate::domain::{Endpoint, TransportError};
use crate::ports::{
    BroadcastClient, Connector, DeliverClient, DeliverStream, DiscoveryClient, EndorserClient,
    RemoteService, StreamEvent,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::discovery::{DiscoveryResponse, SignedRequest};
use shared_types::peer::{
    ChaincodeAction, Endorsement, ProposalResponse, ProposalResponsePayload, Response,
    SignedProposal,
};
use shared_types::{
    Block, BlockType, BroadcastResponse, DeliverResponse, Envelope, FilteredBlock,
    PrivateDataMap, Status,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

// =============================================================================
// Endorser
// =============================================================================

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Fail(String),
    Hang,
}

impl<T: Clone> Reply<T> {
    async fn produce(&self) -> Result<T, TransportError> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Fail(reason) => Err(TransportError::new(reason.clone())),
            Reply::Hang => futures::future::pending().await,
        }
    }
}

/// Mock endorser with a fixed reply.
pub struct MockEndorser {
    reply: Mutex<Reply<ProposalResponse>>,
    calls: AtomicUsize,
    closed: AtomicBool,
    last: Mutex<Option<SignedProposal>>,
}

impl MockEndorser {
    fn with_reply(reply: Reply<ProposalResponse>) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            last: Mutex::new(None),
        }
    }

    /// Status 200 with `payload`.
    pub fn succeeding(payload: &[u8]) -> Self {
        Self::responding(200, "", payload)
    }

    /// A chaincode response with the given status.
    pub fn responding(status: i32, message: &str, payload: &[u8]) -> Self {
        Self::with_reply(Reply::Ok(proposal_response(status, message, payload)))
    }

    /// Transport failure on every call.
    pub fn failing(reason: &str) -> Self {
        Self::with_reply(Reply::Fail(reason.to_string()))
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self::with_reply(Reply::Hang)
    }

    pub fn set_failing(&self, reason: &str) {
        *self.reply.lock() = Reply::Fail(reason.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_proposal(&self) -> Option<SignedProposal> {
        self.last.lock().clone()
    }
}

/// Proposal response the way an endorser builds one.
pub fn proposal_response(status: i32, message: &str, payload: &[u8]) -> ProposalResponse {
    let response = Response {
        status,
        message: message.to_string(),
        payload: payload.to_vec(),
    };
    let action = ChaincodeAction {
        response: response.clone(),
        ..Default::default()
    };
    let response_payload = ProposalResponsePayload {
        proposal_hash: vec![0; 32],
        extension: shared_types::encode("ChaincodeAction", &action).unwrap_or_default(),
    };
    ProposalResponse {
        version: 1,
        response,
        payload: shared_types::encode("ProposalResponsePayload", &response_payload)
            .unwrap_or_default(),
        endorsement: (status < 400).then(|| Endorsement {
            endorser: b"mock-endorser".to_vec(),
            signature: vec![7; 64],
        }),
    }
}

#[async_trait]
impl RemoteService for MockEndorser {
    async fn wait_for_ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EndorserClient for MockEndorser {
    async fn process_proposal(
        &self,
        proposal: SignedProposal,
    ) -> Result<ProposalResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(proposal);
        let reply = self.reply.lock().clone();
        reply.produce().await
    }
}

// =============================================================================
// Broadcast
// =============================================================================

/// Mock orderer broadcast service.
pub struct MockBroadcast {
    reply: Mutex<Reply<BroadcastResponse>>,
    calls: AtomicUsize,
    closed: AtomicBool,
}

impl MockBroadcast {
    fn with_reply(reply: Reply<BroadcastResponse>) -> Self {
        Self {
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_reply(Reply::Ok(BroadcastResponse::success()))
    }

    /// Answers with a non-success status.
    pub fn rejecting(status: Status) -> Self {
        Self::with_reply(Reply::Ok(BroadcastResponse {
            status,
            info: format!("rejected with {status}"),
        }))
    }

    pub fn failing(reason: &str) -> Self {
        Self::with_reply(Reply::Fail(reason.to_string()))
    }

    pub fn hanging() -> Self {
        Self::with_reply(Reply::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteService for MockBroadcast {
    async fn wait_for_ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BroadcastClient for MockBroadcast {
    async fn broadcast(&self, _envelope: Envelope) -> Result<BroadcastResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().clone();
        reply.produce().await
    }
}

// =============================================================================
// Deliver
// =============================================================================

/// Test handle feeding one delivery stream.
#[derive(Clone)]
pub struct DeliverFeed {
    tx: mpsc::UnboundedSender<StreamEvent>,
}

impl DeliverFeed {
    /// Push an event; false once the consumer dropped the stream.
    pub fn send(&self, event: StreamEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn block(&self, block: Block) -> bool {
        self.send(StreamEvent::Data(DeliverResponse::Block(block)))
    }

    pub fn filtered(&self, block: FilteredBlock) -> bool {
        self.send(StreamEvent::Data(DeliverResponse::FilteredBlock(block)))
    }

    pub fn private(&self, block: Block, private_data_map: PrivateDataMap) -> bool {
        self.send(StreamEvent::Data(DeliverResponse::BlockAndPrivateData {
            block,
            private_data_map,
        }))
    }

    pub fn status(&self, status: Status) -> bool {
        self.send(StreamEvent::Data(DeliverResponse::Status(status)))
    }

    pub fn end(&self) -> bool {
        self.send(StreamEvent::End)
    }

    pub fn error(&self, reason: &str) -> bool {
        self.send(StreamEvent::Error(TransportError::new(reason)))
    }

    /// True once the consumer dropped the stream.
    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Mock delivery service handing out pre-arranged streams in order.
#[derive(Default)]
pub struct MockDeliver {
    streams: Mutex<VecDeque<Result<mpsc::UnboundedReceiver<StreamEvent>, String>>>,
    requests: Mutex<Vec<(BlockType, Envelope)>>,
    closed: AtomicBool,
}

impl MockDeliver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrange the next stream and return its feed.
    pub fn feed(&self) -> DeliverFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().push_back(Ok(rx));
        DeliverFeed { tx }
    }

    /// Make the next stream open fail.
    pub fn fail_next(&self, reason: &str) {
        self.streams.lock().push_back(Err(reason.to_string()));
    }

    /// Seek requests received, in order.
    pub fn requests(&self) -> Vec<(BlockType, Envelope)> {
        self.requests.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteService for MockDeliver {
    async fn wait_for_ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeliverClient for MockDeliver {
    async fn deliver(
        &self,
        block_type: BlockType,
        envelope: Envelope,
    ) -> Result<DeliverStream, TransportError> {
        self.requests.lock().push((block_type, envelope));
        let next = self.streams.lock().pop_front();
        match next {
            Some(Ok(rx)) => Ok(Box::pin(UnboundedReceiverStream::new(rx))),
            Some(Err(reason)) => Err(TransportError::new(reason)),
            None => Err(TransportError::new("no delivery stream available")),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Mock discovery service returning a settable response.
pub struct MockDiscovery {
    reply: Mutex<Reply<DiscoveryResponse>>,
    calls: AtomicUsize,
    last: Mutex<Option<SignedRequest>>,
    closed: AtomicBool,
}

impl MockDiscovery {
    pub fn new(response: DiscoveryResponse) -> Self {
        Self {
            reply: Mutex::new(Reply::Ok(response)),
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn failing(reason: &str) -> Self {
        let mock = Self::new(DiscoveryResponse::default());
        *mock.reply.lock() = Reply::Fail(reason.to_string());
        mock
    }

    pub fn set_response(&self, response: DiscoveryResponse) {
        *self.reply.lock() = Reply::Ok(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SignedRequest> {
        self.last.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteService for MockDiscovery {
    async fn wait_for_ready(&self) -> Result<(), TransportError> {
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DiscoveryClient for MockDiscovery {
    async fn discover(&self, request: SignedRequest) -> Result<DiscoveryResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(request);
        let reply = self.reply.lock().clone();
        reply.produce().await
    }
}

// =============================================================================
// Connector
// =============================================================================

/// Connector resolving `host:port` to pre-registered service clients.
pub struct MockConnector<C: ?Sized> {
    services: Mutex<HashMap<String, Arc<C>>>,
    connected: Mutex<Vec<Endpoint>>,
}

impl<C: ?Sized> Default for MockConnector<C> {
    fn default() -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
            connected: Mutex::new(Vec::new()),
        }
    }
}

impl<C: ?Sized> MockConnector<C> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, addr: &str, service: Arc<C>) -> Self {
        self.insert(addr, service);
        self
    }

    pub fn insert(&self, addr: &str, service: Arc<C>) {
        self.services.lock().insert(addr.to_string(), service);
    }

    /// Endpoints successfully connected, in order.
    pub fn connected(&self) -> Vec<Endpoint> {
        self.connected.lock().clone()
    }
}

#[async_trait]
impl<C: ?Sized + RemoteService> Connector<C> for MockConnector<C> {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<C>, TransportError> {
        let service = self.services.lock().get(&endpoint.addr()).cloned();
        match service {
            Some(service) => {
                self.connected.lock().push(endpoint.clone());
                Ok(service)
            }
            None => Err(TransportError::new(format!(
                "connection refused: {}",
                endpoint.addr()
            ))),
        }
    }
}
