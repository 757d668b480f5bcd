//! # Events and Terminations
//!
//! What a listener receives: a [`Delivery`] that is either a [`BlockEvent`]
//! or the hub's single [`Termination`].

use shared_types::{
    BlockNum, ChaincodeEvent, ConnectionInfo, DecodedBlock, FilteredBlock, PrivateDataMap,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One notification for one listener.
///
/// Every listener gets its own event; the decoded block forms are shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockEvent {
    /// Name of the hub that produced the event.
    pub hub: String,
    pub block_number: BlockNum,
    pub block: Option<Arc<DecodedBlock>>,
    pub filtered_block: Option<Arc<FilteredBlock>>,
    pub private_data: Option<Arc<PrivateDataMap>>,
    pub transaction_id: Option<String>,
    /// Validation code label, e.g. `VALID`.
    pub transaction_status: Option<String>,
    pub chaincode_events: Vec<ChaincodeEvent>,
    /// Set on the final event of a listener whose end block was reached.
    pub end_block_received: bool,
}

impl BlockEvent {
    /// Final event for a listener whose window closed at `block_number`.
    #[must_use]
    pub fn end_block(hub: &str, block_number: BlockNum) -> Self {
        Self {
            hub: hub.to_string(),
            block_number,
            end_block_received: true,
            ..Default::default()
        }
    }
}

/// Why a hub shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationKind {
    /// `close()` was called.
    Closed,
    /// The hub's configured end block was delivered.
    EndBlockReached,
    /// The stream was asked to stop at the newest block and did.
    NewestBlockReached,
    /// The remote ended the stream.
    StreamEnded,
    /// The stream failed.
    StreamError,
    /// The remote sent a status other than `SUCCESS`.
    UnexpectedStatus,
    /// A delivered block could not be decoded.
    DecodeError,
    /// No data arrived before the setup timer fired.
    SetupTimeout,
    /// No event source could be started.
    SetupFailed,
}

impl TerminationKind {
    /// True for shutdowns the application asked for.
    #[must_use]
    pub fn is_clean(self) -> bool {
        matches!(
            self,
            TerminationKind::Closed
                | TerminationKind::EndBlockReached
                | TerminationKind::NewestBlockReached
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationKind::Closed => "closed",
            TerminationKind::EndBlockReached => "end_block_reached",
            TerminationKind::NewestBlockReached => "newest_block_reached",
            TerminationKind::StreamEnded => "stream_ended",
            TerminationKind::StreamError => "stream_error",
            TerminationKind::UnexpectedStatus => "unexpected_status",
            TerminationKind::DecodeError => "decode_error",
            TerminationKind::SetupTimeout => "setup_timeout",
            TerminationKind::SetupFailed => "setup_failed",
        }
    }
}

impl fmt::Display for TerminationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal notification every listener registered at shutdown gets
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Termination {
    pub hub: String,
    pub kind: TerminationKind,
    pub message: String,
    /// Event source the stream was attached to, if any.
    pub connection: Option<ConnectionInfo>,
    pub last_block_number: Option<BlockNum>,
}

impl Termination {
    pub fn new(hub: &str, kind: TerminationKind, message: impl Into<String>) -> Self {
        Self {
            hub: hub.to_string(),
            kind,
            message: message.into(),
            connection: None,
            last_block_number: None,
        }
    }

    pub(crate) fn closed(hub: &str) -> Self {
        Self::new(hub, TerminationKind::Closed, "EventHub has been shutdown by \"close()\" call")
    }

    pub(crate) fn end_block(hub: &str, block: BlockNum) -> Self {
        Self::new(
            hub,
            TerminationKind::EndBlockReached,
            format!("Shutdown due to end block number has been seen: {block}"),
        )
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.kind.is_clean()
    }
}

/// What a listener sink receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Event(BlockEvent),
    Terminated(Termination),
}

impl Delivery {
    #[must_use]
    pub fn event(&self) -> Option<&BlockEvent> {
        match self {
            Delivery::Event(event) => Some(event),
            Delivery::Terminated(_) => None,
        }
    }

    #[must_use]
    pub fn termination(&self) -> Option<&Termination> {
        match self {
            Delivery::Event(_) => None,
            Delivery::Terminated(t) => Some(t),
        }
    }

    /// Callback-style view: `Err` for the terminal notification.
    pub fn into_result(self) -> Result<BlockEvent, Termination> {
        match self {
            Delivery::Event(event) => Ok(event),
            Delivery::Terminated(t) => Err(t),
        }
    }
}
