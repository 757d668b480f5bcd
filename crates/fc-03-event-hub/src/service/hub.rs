//! # Event Hub
//!
//! One delivery stream per hub, fanned out to many listeners.
//!
//! ```text
//!           build ─> sign ─> send(targets)
//!                              │ first data before the setup timer
//!                              ▼
//!   ┌──────────── listening (generation g) ─────────────┐
//!   │ data(block)   dispatch passes, hub end block check │
//!   │ status        SUCCESS after end → clean shutdown   │
//!   │               anything else    → shutdown          │
//!   │ end / error   shutdown                            │
//!   └────────────────────────┬──────────────────────────┘
//!                            ▼
//!             close_with(termination), exactly once per listener
//! ```
//!
//! Events of a stream whose generation is no longer current are dropped.
//! Listener sinks run outside every hub lock, from a single drain loop, so
//! a callback may register, unregister or close re-entrantly.

use super::dispatch::{dispatch, DeliveredBlock, Outgoing};
use super::eventer::Eventer;
use super::registry::{ListenerRegistry, SharedSink};
use crate::domain::{
    plan_seek, Delivery, EventHubConfig, EventHubError, EventListener,
    EventNameMatch, ListenerFilter, ListenerHandle, ListenerKind, ListenerOptions, Termination,
    TerminationKind, TxMatch,
};
use crate::ports::{ChannelSink, ListenerSink};
use fc_01_endpoint::{Connectable, DeliverStream, ServiceError, StreamEvent};
use fc_02_service_action::service::header::{channel_header, header};
use fc_02_service_action::{ActionState, Signable};
use futures::StreamExt;
use parking_lot::Mutex;
use shared_crypto::IdentityContext;
use shared_types::{
    encode, BlockNum, BlockPosition, BlockType, DeliverResponse, Envelope, HeaderType, Payload,
    Status,
};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Positions and block form for `build`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartRequest {
    pub start_block: Option<BlockPosition>,
    pub end_block: Option<BlockPosition>,
    pub block_type: Option<BlockType>,
}

/// Event sources for `send`, tried in order.
#[derive(Debug, Clone, Default)]
pub struct SendRequest {
    pub targets: Vec<Arc<Eventer>>,
    /// Setup timer. Falls back to the hub config, then to the event
    /// source's request timeout.
    pub request_timeout: Option<Duration>,
}

impl SendRequest {
    pub fn new(targets: Vec<Arc<Eventer>>) -> Self {
        Self {
            targets,
            request_timeout: None,
        }
    }
}

/// The signed seek request a hub streams with.
#[derive(Debug, Default)]
struct SeekRequest {
    state: ActionState,
    block_type: BlockType,
    end: Option<BlockPosition>,
}

impl Signable for SeekRequest {
    const ACTION: &'static str = "EventHub";

    fn state(&self) -> &ActionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ActionState {
        &mut self.state
    }
}

struct ActiveStream {
    generation: u64,
    eventer: Arc<Eventer>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct HubState {
    registry: ListenerRegistry,
    last_block_number: Option<BlockNum>,
    end_block: Option<BlockPosition>,
    end_block_seen: bool,
    stream: Option<ActiveStream>,
    generation: u64,
    closing: bool,
}

impl HubState {
    fn is_current(&self, generation: u64) -> bool {
        self.stream.as_ref().map(|s| s.generation) == Some(generation)
    }
}

#[derive(Default)]
struct Outbox {
    queue: VecDeque<(SharedSink, Delivery)>,
    draining: bool,
}

struct HubInner {
    name: String,
    channel: String,
    config: EventHubConfig,
    request: Mutex<SeekRequest>,
    state: Mutex<HubState>,
    /// Taken after `state` when both are held, never before.
    outbox: Mutex<Outbox>,
}

/// Event hub for one channel. Cloning yields another handle to the same hub.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<HubInner>,
}

impl EventHub {
    pub fn new(
        name: impl Into<String>,
        channel: impl Into<String>,
        config: EventHubConfig,
    ) -> Result<Self, EventHubError> {
        let name = name.into();
        let channel = channel.into();
        if name.is_empty() {
            return Err(EventHubError::MissingParameter("name"));
        }
        if channel.is_empty() {
            return Err(EventHubError::MissingParameter("channel"));
        }
        Ok(Self {
            inner: Arc::new(HubInner {
                name,
                channel,
                config,
                request: Mutex::new(SeekRequest::default()),
                state: Mutex::new(HubState::default()),
                outbox: Mutex::new(Outbox::default()),
            }),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn channel_name(&self) -> &str {
        &self.inner.channel
    }

    // -------------------------------------------------------------------------
    // Build / sign
    // -------------------------------------------------------------------------

    /// Build the seek request. `last_seen` positions resolve now, against
    /// the last block this hub observed. Returns the payload bytes.
    pub fn build(
        &self,
        identity: &dyn IdentityContext,
        request: StartRequest,
    ) -> Result<Vec<u8>, EventHubError> {
        let plan = plan_seek(request.start_block, request.end_block, self.last_block_number())?;
        let tx = identity.calculate_transaction_id()?;
        let channel_header = channel_header(
            HeaderType::DeliverSeekInfo,
            &self.inner.channel,
            &tx.tx_id,
            Vec::new(),
            identity.client_cert_hash(),
        );
        let payload = Payload {
            header: header(identity, &channel_header, &tx)?,
            data: encode("SeekInfo", &plan.info)?,
        };
        let bytes = encode("Payload", &payload)?;

        let mut seek = self.inner.request.lock();
        seek.state.set_payload(bytes.clone());
        seek.block_type = request
            .block_type
            .unwrap_or(self.inner.config.default_block_type);
        seek.end = plan.end;
        debug!(hub = %self.inner.name, start = ?plan.info.start, stop = ?plan.info.stop, "seek request built");
        Ok(bytes)
    }

    pub fn sign(&self, identity: &dyn IdentityContext) -> Result<(), EventHubError> {
        Ok(self.inner.request.lock().sign(identity)?)
    }

    /// Attach a signature computed outside the client.
    pub fn sign_with(&self, signature: Vec<u8>) -> Result<(), EventHubError> {
        Ok(self.inner.request.lock().sign_with(signature)?)
    }

    /// Built payload bytes, for external signing.
    pub fn payload_bytes(&self) -> Result<Vec<u8>, EventHubError> {
        Ok(self.inner.request.lock().payload_bytes()?)
    }

    // -------------------------------------------------------------------------
    // Send
    // -------------------------------------------------------------------------

    /// Start streaming from the first target that delivers data before the
    /// setup timer fires. A stream already running is replaced.
    ///
    /// When no target starts, the hub shuts down with the last failure and
    /// that failure is returned.
    pub async fn send(&self, request: SendRequest) -> Result<(), EventHubError> {
        if request.targets.is_empty() {
            return Err(EventHubError::MissingParameter("targets"));
        }
        let (envelope, block_type, end) = {
            let seek = self.inner.request.lock();
            (seek.signed_envelope()?, seek.block_type, seek.end)
        };
        self.inner.stop_stream();

        let timeout = request.request_timeout.or(self.inner.config.setup_timeout());
        let mut last_error = None;
        for eventer in &request.targets {
            match self.start_on(eventer, block_type, &envelope, timeout).await {
                Ok(stream) => {
                    self.inner.install(eventer.clone(), end, stream);
                    return Ok(());
                }
                Err(e) => {
                    warn!(hub = %self.inner.name, eventer = %eventer.name(), error = %e, "event service failed to start");
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.unwrap_or(ServiceError::MissingParameter("targets"));
        let (kind, message) = if error.is_timeout() {
            (
                TerminationKind::SetupTimeout,
                "Event service timed out - Unable to start listening".to_string(),
            )
        } else {
            (TerminationKind::SetupFailed, error.to_string())
        };
        let mut termination = Termination::new(&self.inner.name, kind, message);
        termination.connection = error.connection().cloned();
        self.inner.close_with(termination);
        Err(error.into())
    }

    /// Open a stream on `eventer` and wait for its first message.
    async fn start_on(
        &self,
        eventer: &Arc<Eventer>,
        block_type: BlockType,
        envelope: &Envelope,
        timeout: Option<Duration>,
    ) -> Result<(DeliverStream, DeliverResponse), ServiceError> {
        eventer.ensure_connected().await?;
        let limit = eventer.request_timeout(timeout);
        let connection = eventer.connection_info();

        let started = tokio::time::timeout(limit, async {
            let mut stream = eventer.open_stream(block_type, envelope, Some(limit)).await?;
            match stream.next().await {
                Some(StreamEvent::Data(first)) => Ok((stream, first)),
                Some(StreamEvent::Error(e)) => Err(ServiceError::Transport {
                    connection: connection.clone(),
                    operation: "deliver",
                    reason: e.0,
                }),
                Some(StreamEvent::End) | None => Err(ServiceError::Transport {
                    connection: connection.clone(),
                    operation: "deliver",
                    reason: "stream ended before any data".to_string(),
                }),
            }
        })
        .await;

        match started {
            Ok(Ok(started)) => Ok(started),
            Ok(Err(e)) => {
                eventer.disconnect();
                Err(e)
            }
            Err(_) => {
                eventer.disconnect();
                Err(ServiceError::Timeout {
                    connection,
                    operation: "startEventService",
                    timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a listener with any sink.
    pub fn register(
        &self,
        filter: ListenerFilter,
        options: ListenerOptions,
        sink: Box<dyn ListenerSink>,
    ) -> Result<ListenerHandle, EventHubError> {
        let listener = EventListener::new(filter, options)?;
        let kind = listener.kind();
        let handle = self.inner.state.lock().registry.insert(listener, sink);
        debug!(hub = %self.inner.name, %handle, %kind, "listener registered");
        Ok(handle)
    }

    pub fn register_block_listener<F>(
        &self,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, EventHubError>
    where
        F: FnMut(Delivery) + Send + 'static,
    {
        self.register(ListenerFilter::Block, options, Box::new(callback))
    }

    /// `tx_id` may be `"all"`.
    pub fn register_transaction_listener<F>(
        &self,
        tx_id: &str,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, EventHubError>
    where
        F: FnMut(Delivery) + Send + 'static,
    {
        self.register(ListenerFilter::Tx(TxMatch::parse(tx_id)?), options, Box::new(callback))
    }

    pub fn register_chaincode_listener<F>(
        &self,
        chaincode_id: &str,
        event_name: EventNameMatch,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, EventHubError>
    where
        F: FnMut(Delivery) + Send + 'static,
    {
        self.register(chaincode_filter(chaincode_id, event_name)?, options, Box::new(callback))
    }

    /// Channel form of [`register_block_listener`](Self::register_block_listener).
    pub fn subscribe_blocks(
        &self,
        options: ListenerOptions,
    ) -> Result<(ListenerHandle, mpsc::UnboundedReceiver<Delivery>), EventHubError> {
        self.subscribe(ListenerFilter::Block, options)
    }

    pub fn subscribe_transaction(
        &self,
        tx_id: &str,
        options: ListenerOptions,
    ) -> Result<(ListenerHandle, mpsc::UnboundedReceiver<Delivery>), EventHubError> {
        self.subscribe(ListenerFilter::Tx(TxMatch::parse(tx_id)?), options)
    }

    pub fn subscribe_chaincode(
        &self,
        chaincode_id: &str,
        event_name: EventNameMatch,
        options: ListenerOptions,
    ) -> Result<(ListenerHandle, mpsc::UnboundedReceiver<Delivery>), EventHubError> {
        self.subscribe(chaincode_filter(chaincode_id, event_name)?, options)
    }

    fn subscribe(
        &self,
        filter: ListenerFilter,
        options: ListenerOptions,
    ) -> Result<(ListenerHandle, mpsc::UnboundedReceiver<Delivery>), EventHubError> {
        let (sink, rx) = ChannelSink::new();
        let handle = self.register(filter, options, Box::new(sink))?;
        Ok((handle, rx))
    }

    /// Remove a registration. False if it was already gone.
    pub fn unregister(&self, handle: ListenerHandle) -> bool {
        let removed = self.inner.state.lock().registry.remove(handle).is_some();
        debug!(hub = %self.inner.name, %handle, removed, "listener unregistered");
        removed
    }

    // -------------------------------------------------------------------------
    // Shutdown / introspection
    // -------------------------------------------------------------------------

    /// Shut down: every registered listener receives one `Closed`
    /// termination and the stream is torn down. Repeated calls are no-ops
    /// for listeners already notified.
    pub fn close(&self) {
        self.inner.close_with(Termination::closed(&self.inner.name));
    }

    #[must_use]
    pub fn last_block_number(&self) -> Option<BlockNum> {
        self.inner.state.lock().last_block_number
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.state.lock().stream.is_some()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().registry.len()
    }

    #[must_use]
    pub fn has_listeners_of(&self, kind: ListenerKind) -> bool {
        self.inner.state.lock().registry.has(kind)
    }

    /// Whether the configured end block has been delivered.
    #[must_use]
    pub fn end_block_seen(&self) -> bool {
        self.inner.state.lock().end_block_seen
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("name", &self.inner.name)
            .field("channel", &self.inner.channel)
            .field("listening", &self.is_listening())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn chaincode_filter(chaincode_id: &str, event_name: EventNameMatch) -> Result<ListenerFilter, EventHubError> {
    if chaincode_id.is_empty() {
        return Err(EventHubError::MissingParameter("chaincodeId"));
    }
    Ok(ListenerFilter::Chaincode {
        chaincode_id: chaincode_id.to_string(),
        event_name,
    })
}

// =============================================================================
// Stream handling
// =============================================================================

impl HubInner {
    /// Make `stream` the current one and spawn its reader.
    fn install(
        self: &Arc<Self>,
        eventer: Arc<Eventer>,
        end: Option<BlockPosition>,
        (stream, first): (DeliverStream, DeliverResponse),
    ) {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.end_block = end;
            state.end_block_seen = false;
            state.stream = Some(ActiveStream {
                generation: state.generation,
                eventer: eventer.clone(),
                task: None,
            });
            state.generation
        };
        info!(hub = %self.name, eventer = %eventer.name(), generation, "event service started");

        self.on_message(generation, first);

        let inner = Arc::clone(self);
        let task = tokio::spawn(async move { inner.read_stream(generation, stream).await });
        let mut state = self.state.lock();
        match state.stream.as_mut() {
            Some(active) if active.generation == generation => active.task = Some(task),
            // The first message already shut the stream down.
            _ => task.abort(),
        }
    }

    async fn read_stream(self: Arc<Self>, generation: u64, mut stream: DeliverStream) {
        loop {
            match stream.next().await {
                Some(StreamEvent::Data(message)) => self.on_message(generation, message),
                Some(StreamEvent::Error(e)) => {
                    self.on_stream_closed(
                        generation,
                        TerminationKind::StreamError,
                        format!("Event stream error: {e}"),
                    );
                    break;
                }
                Some(StreamEvent::End) | None => {
                    self.on_stream_closed(
                        generation,
                        TerminationKind::StreamEnded,
                        "Event stream has ended".to_string(),
                    );
                    break;
                }
            }
            if !self.state.lock().is_current(generation) {
                break;
            }
        }
        debug!(hub = %self.name, generation, "stream reader finished");
    }

    fn on_message(&self, generation: u64, message: DeliverResponse) {
        if let DeliverResponse::Status(status) = message {
            self.on_status(generation, status);
            return;
        }
        let block = match DeliveredBlock::from_response(&self.name, message) {
            Ok(Some(block)) => block,
            Ok(None) => return,
            Err(termination) => {
                if self.state.lock().is_current(generation) {
                    self.close_with(termination);
                }
                return;
            }
        };

        let end_reached = {
            let mut state = self.state.lock();
            if !state.is_current(generation) {
                debug!(hub = %self.name, generation, block = %block.number, "dropping block from superseded stream");
                return;
            }
            state.last_block_number = Some(block.number);
            let outgoing = dispatch(&self.name, &mut state.registry, &block);
            // Queued under the state lock so a concurrent close cannot
            // enqueue its termination ahead of these events.
            self.enqueue(outgoing);
            match state.end_block {
                Some(BlockPosition::Number(end)) if end <= block.number => {
                    state.end_block_seen = true;
                    true
                }
                _ => false,
            }
        };
        self.flush();

        if end_reached {
            self.close_with(Termination::end_block(&self.name, block.number));
        }
    }

    fn on_status(&self, generation: u64, status: Status) {
        let termination = {
            let state = self.state.lock();
            if !state.is_current(generation) {
                return;
            }
            let clean = status.is_success()
                && (state.end_block_seen || state.end_block == Some(BlockPosition::Newest));
            match (clean, state.end_block) {
                (true, Some(BlockPosition::Newest)) if !state.end_block_seen => Termination::new(
                    &self.name,
                    TerminationKind::NewestBlockReached,
                    "Newest block received",
                ),
                (true, _) => Termination::new(
                    &self.name,
                    TerminationKind::EndBlockReached,
                    format!("Requested blocks delivered, status:{status}"),
                ),
                (false, _) => Termination::new(
                    &self.name,
                    TerminationKind::UnexpectedStatus,
                    format!("Event stream has received an unexpected status message. status:{status}"),
                ),
            }
        };
        self.close_with(termination);
    }

    fn on_stream_closed(&self, generation: u64, kind: TerminationKind, message: String) {
        if !self.state.lock().is_current(generation) {
            return;
        }
        self.close_with(Termination::new(&self.name, kind, message));
    }

    /// Abort the current stream without notifying listeners.
    fn stop_stream(&self) {
        let stream = self.state.lock().stream.take();
        if let Some(stream) = stream {
            debug!(hub = %self.name, generation = stream.generation, "replacing event stream");
            teardown(stream);
        }
    }

    /// Deliver `termination` to every registered listener, clear the
    /// registry and tear the stream down. Re-entrant calls are dropped.
    fn close_with(&self, mut termination: Termination) {
        let (listeners, stream) = {
            let mut state = self.state.lock();
            if state.closing {
                debug!(hub = %self.name, "close already running");
                return;
            }
            state.closing = true;
            termination.last_block_number = state.last_block_number;
            let stream = state.stream.take();
            if termination.connection.is_none() {
                termination.connection = stream.as_ref().map(|s| s.eventer.connection_info());
            }
            let registrations = state.registry.drain();
            let listeners = registrations.len();
            self.enqueue(
                registrations
                    .into_iter()
                    .map(|r| (r.sink, Delivery::Terminated(termination.clone())))
                    .collect(),
            );
            (listeners, stream)
        };

        if termination.is_clean() {
            info!(hub = %self.name, kind = %termination.kind, listeners, "event hub shutting down");
        } else {
            warn!(hub = %self.name, kind = %termination.kind, error = %termination, listeners, "event hub shutting down");
        }
        self.flush();

        if let Some(stream) = stream {
            teardown(stream);
        }
        self.state.lock().closing = false;
    }

    fn enqueue(&self, outgoing: Outgoing) {
        if outgoing.is_empty() {
            return;
        }
        self.outbox.lock().queue.extend(outgoing);
    }

    /// Deliver queued notifications in order. Only one caller drains at a
    /// time; a nested call returns at once and its items are delivered by
    /// the caller already draining.
    fn flush(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        loop {
            let next = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(next) => next,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.deliver(next);
        }
    }

    fn deliver(&self, (sink, delivery): (SharedSink, Delivery)) {
        let delivered = catch_unwind(AssertUnwindSafe(|| sink.lock().deliver(delivery)));
        if delivered.is_err() {
            error!(hub = %self.name, "listener callback panicked");
        }
    }
}

fn teardown(stream: ActiveStream) {
    if let Some(task) = stream.task {
        task.abort();
    }
    stream.eventer.disconnect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_01_endpoint::{DeliverClient, DeliverFeed, Endpoint, MockConnector, MockDeliver};
    use shared_crypto::EcdsaIdentity;
    use shared_types::test_utils::{filtered_block, TxFixture};
    use shared_types::{decode, Block, SeekBehavior, SeekInfo, SeekPosition};

    type Recorded = Arc<Mutex<Vec<Delivery>>>;

    fn recorder() -> (impl FnMut(Delivery) + Send + 'static, Recorded) {
        let seen: Recorded = Arc::default();
        let sink = seen.clone();
        (move |d: Delivery| sink.lock().push(d), seen)
    }

    async fn eventer(addr: &str, deliver: Arc<MockDeliver>) -> Arc<Eventer> {
        let connector = Arc::new(MockConnector::<dyn DeliverClient>::new().with(addr, deliver));
        let eventer = Eventer::new(addr, Some("Org1MSP".into()));
        eventer
            .connect(Endpoint::parse(&format!("grpc://{addr}")).unwrap(), connector)
            .await
            .unwrap();
        Arc::new(eventer)
    }

    fn signed_hub(request: StartRequest) -> EventHub {
        let identity = EcdsaIdentity::generate("Org1MSP").unwrap();
        let hub = EventHub::new("hub", "mychannel", EventHubConfig::default()).unwrap();
        hub.build(&identity, request).unwrap();
        hub.sign(&identity).unwrap();
        hub
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    async fn started(deliver: &Arc<MockDeliver>, hub: &EventHub) -> DeliverFeed {
        let feed = deliver.feed();
        feed.filtered(filtered_block(1, &[]));
        let source = eventer("peer1:7053", deliver.clone()).await;
        hub.send(SendRequest::new(vec![source])).await.unwrap();
        feed
    }

    #[test]
    fn test_build_seek_info() {
        let identity = EcdsaIdentity::generate("Org1MSP").unwrap();
        let hub = EventHub::new("hub", "mychannel", EventHubConfig::default()).unwrap();
        let bytes = hub
            .build(
                &identity,
                StartRequest {
                    start_block: Some(3u64.into()),
                    end_block: Some(8u64.into()),
                    block_type: Some(BlockType::Full),
                },
            )
            .unwrap();
        let payload: Payload = decode("Payload", &bytes).unwrap();
        let seek: SeekInfo = decode("SeekInfo", &payload.data).unwrap();
        assert_eq!(seek.start, SeekPosition::Specified(3));
        assert_eq!(seek.stop, SeekPosition::Specified(8));
        assert_eq!(seek.behavior, SeekBehavior::FailIfNotReady);

        assert!(matches!(
            hub.build(
                &identity,
                StartRequest {
                    start_block: Some(9u64.into()),
                    end_block: Some(8u64.into()),
                    block_type: None,
                }
            ),
            Err(EventHubError::InvalidRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_send_requires_signature_and_targets() {
        let identity = EcdsaIdentity::generate("Org1MSP").unwrap();
        let hub = EventHub::new("hub", "mychannel", EventHubConfig::default()).unwrap();
        hub.build(&identity, StartRequest::default()).unwrap();
        assert_eq!(
            hub.send(SendRequest::default()).await,
            Err(EventHubError::MissingParameter("targets"))
        );
        let source = eventer("peer1:7053", Arc::new(MockDeliver::new())).await;
        assert!(matches!(
            hub.send(SendRequest::new(vec![source])).await,
            Err(EventHubError::Action(_))
        ));
    }

    #[tokio::test]
    async fn test_blocks_reach_listeners() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        feed.filtered(filtered_block(2, &[]));
        settle().await;

        let numbers: Vec<_> = seen
            .lock()
            .iter()
            .filter_map(|d| d.event().map(|e| e.block_number.value()))
            .collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(hub.last_block_number(), Some(BlockNum::new(2)));
        assert!(hub.is_listening());
        assert_eq!(deliver.requests()[0].0, BlockType::Filtered);
    }

    #[tokio::test]
    async fn test_close_notifies_once() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();
        let (_, mut rx) = hub.subscribe_transaction("all", ListenerOptions::default()).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;

        hub.close();
        hub.close();

        let terminations: Vec<_> = seen.lock().iter().filter_map(|d| d.termination().cloned()).collect();
        assert_eq!(terminations.len(), 1);
        assert_eq!(terminations[0].kind, TerminationKind::Closed);
        assert!(matches!(rx.try_recv(), Ok(Delivery::Terminated(_))));
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.listener_count(), 0);
        assert!(!hub.is_listening());
        assert!(deliver.is_closed());
        settle().await;
        assert!(feed.is_cancelled());
    }

    #[tokio::test]
    async fn test_stream_end_and_error_shut_down() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        feed.error("connection reset");
        settle().await;

        let seen = seen.lock();
        let termination = seen.last().and_then(Delivery::termination).unwrap();
        assert_eq!(termination.kind, TerminationKind::StreamError);
        assert!(termination.message.contains("connection reset"));
        assert!(termination.connection.is_some());
        assert!(!hub.is_listening());
    }

    #[tokio::test]
    async fn test_unexpected_status_is_fatal() {
        let hub = signed_hub(StartRequest::default());
        let (_, mut rx) = hub.subscribe_blocks(ListenerOptions::default()).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        feed.status(Status::Forbidden);
        settle().await;

        let mut last = None;
        while let Ok(d) = rx.try_recv() {
            last = Some(d);
        }
        let termination = last.and_then(|d| d.into_result().err()).unwrap();
        assert_eq!(termination.kind, TerminationKind::UnexpectedStatus);
        assert!(termination.message.contains("FORBIDDEN"));
    }

    #[tokio::test]
    async fn test_newest_end_closes_cleanly_on_success() {
        let hub = signed_hub(StartRequest {
            start_block: Some(BlockPosition::Oldest),
            end_block: Some(BlockPosition::Newest),
            block_type: None,
        });
        let (_, mut rx) = hub.subscribe_blocks(ListenerOptions::default()).unwrap();
        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        feed.status(Status::Success);
        settle().await;

        let mut last = None;
        while let Ok(d) = rx.try_recv() {
            last = Some(d);
        }
        let termination = last.and_then(|d| d.into_result().err()).unwrap();
        assert_eq!(termination.kind, TerminationKind::NewestBlockReached);
        assert!(termination.is_clean());
    }

    #[tokio::test]
    async fn test_success_before_numbered_end_is_unexpected() {
        let hub = signed_hub(StartRequest {
            start_block: Some(1u64.into()),
            end_block: Some(10u64.into()),
            block_type: None,
        });
        let (_, mut rx) = hub.subscribe_blocks(ListenerOptions::default()).unwrap();
        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        feed.status(Status::Success);
        settle().await;

        let mut last = None;
        while let Ok(d) = rx.try_recv() {
            last = Some(d);
        }
        let termination = last.and_then(|d| d.into_result().err()).unwrap();
        assert_eq!(termination.kind, TerminationKind::UnexpectedStatus);
        assert!(!termination.is_clean());
        assert_eq!(termination.last_block_number, Some(BlockNum::new(1)));
    }

    #[tokio::test]
    async fn test_undecodable_block_shuts_down() {
        let hub = signed_hub(StartRequest {
            start_block: None,
            end_block: None,
            block_type: Some(BlockType::Full),
        });
        let (callback, seen) = recorder();
        hub.register_transaction_listener("tx1", ListenerOptions::default(), callback)
            .unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        let mut broken = Block::default();
        broken.header.number = 2;
        broken.data.data.push(vec![0xff, 0x01]);
        feed.block(broken);
        settle().await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        let termination = seen[0].termination().unwrap();
        assert_eq!(termination.kind, TerminationKind::DecodeError);
        assert!(termination.message.contains("block 2"));
        assert!(!hub.is_listening());
        assert_eq!(hub.listener_count(), 0);
        settle().await;
        assert!(feed.is_cancelled());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_event_after_termination() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = started(&deliver, &hub).await;
        for n in 2..256 {
            feed.filtered(filtered_block(n, &[]));
        }
        tokio::task::yield_now().await;
        hub.close();
        settle().await;

        let seen = seen.lock();
        assert_eq!(seen.iter().filter(|d| d.termination().is_some()).count(), 1);
        assert!(seen.last().and_then(Delivery::termination).is_some());
    }

    #[tokio::test]
    async fn test_replaced_stream_is_ignored() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let old = started(&deliver, &hub).await;

        let new = deliver.feed();
        new.filtered(filtered_block(10, &[]));
        let source = eventer("peer1:7053", deliver.clone()).await;
        hub.send(SendRequest::new(vec![source])).await.unwrap();
        settle().await;

        old.filtered(filtered_block(2, &[]));
        new.filtered(filtered_block(11, &[]));
        settle().await;

        let numbers: Vec<_> = seen
            .lock()
            .iter()
            .filter_map(|d| d.event().map(|e| e.block_number.value()))
            .collect();
        assert_eq!(numbers, vec![1, 10, 11]);
        assert!(old.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_timeout_tries_next_then_shuts_down() {
        let hub = signed_hub(StartRequest::default());
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let silent = Arc::new(MockDeliver::new());
        let _silent_feed = silent.feed();
        let failing = Arc::new(MockDeliver::new());
        failing.fail_next("unavailable");

        let targets = vec![
            eventer("peer1:7053", silent).await,
            eventer("peer2:7053", failing).await,
        ];
        let err = hub
            .send(SendRequest {
                targets,
                request_timeout: Some(Duration::from_millis(500)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EventHubError::Service(ServiceError::Transport { .. })));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].termination().unwrap().kind, TerminationKind::SetupFailed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_timeout_kind() {
        let hub = signed_hub(StartRequest::default());
        let (_, mut rx) = hub.subscribe_blocks(ListenerOptions::default()).unwrap();
        let silent = Arc::new(MockDeliver::new());
        let _feed = silent.feed();

        let err = hub
            .send(SendRequest {
                targets: vec![eventer("peer1:7053", silent).await],
                request_timeout: Some(Duration::from_millis(500)),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("REQUEST_TIMEOUT"));
        let termination = rx.try_recv().unwrap().into_result().unwrap_err();
        assert_eq!(termination.kind, TerminationKind::SetupTimeout);
    }

    #[tokio::test]
    async fn test_panicking_listener_does_not_block_others() {
        let hub = signed_hub(StartRequest::default());
        hub.register_block_listener(ListenerOptions::default(), |_: Delivery| panic!("listener bug"))
            .unwrap();
        let (callback, seen) = recorder();
        hub.register_block_listener(ListenerOptions::default(), callback).unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let _feed = started(&deliver, &hub).await;
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_callback_may_close_hub() {
        let hub = signed_hub(StartRequest::default());
        let closer = hub.clone();
        hub.register_block_listener(ListenerOptions::default(), move |d: Delivery| {
            if d.event().is_some() {
                closer.close();
            }
        })
        .unwrap();
        let (callback, seen) = recorder();
        hub.register_transaction_listener("all", ListenerOptions::default(), callback)
            .unwrap();

        let deliver = Arc::new(MockDeliver::new());
        let feed = deliver.feed();
        feed.filtered(filtered_block(1, &[TxFixture::endorser("tx1", "mycc")]));
        let source = eventer("peer1:7053", deliver.clone()).await;
        hub.send(SendRequest::new(vec![source])).await.unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].event().is_some());
        assert_eq!(seen[1].termination().unwrap().kind, TerminationKind::Closed);
        assert!(!hub.is_listening());
    }

    #[tokio::test]
    async fn test_unregister_and_introspection() {
        let hub = signed_hub(StartRequest::default());
        let handle = hub
            .register_chaincode_listener(
                "mycc",
                EventNameMatch::exact("transfer"),
                ListenerOptions::default(),
                |_: Delivery| {},
            )
            .unwrap();
        assert!(hub.has_listeners_of(ListenerKind::Chaincode));
        assert!(hub.unregister(handle));
        assert!(!hub.unregister(handle));
        assert!(!hub.has_listeners_of(ListenerKind::Chaincode));
        assert!(matches!(
            hub.register_chaincode_listener("", EventNameMatch::exact("x"), ListenerOptions::default(), |_: Delivery| {}),
            Err(EventHubError::MissingParameter("chaincodeId"))
        ));
    }
}
