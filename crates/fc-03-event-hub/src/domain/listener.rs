//! # Event Listener
//!
//! A registration record: what a listener matches, the block window it
//! cares about and whether it is removed after its first notification.
//!
//! ```text
//! ListenerFilter
//! ├── Block                       every block
//! ├── Tx(TxMatch)                 one transaction id, or "all"
//! └── Chaincode { id, name }      events of one chaincode, exact or regex name
//! ```

use super::errors::EventHubError;
use regex::Regex;
use shared_types::{BlockNum, ChaincodeEvent};
use std::fmt;

/// Transaction id that matches every transaction.
pub const ALL_TRANSACTIONS: &str = "all";

/// Stable id of a registration, returned by every `register_*` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(pub(crate) u64);

impl ListenerHandle {
    #[must_use]
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Block,
    Tx,
    Chaincode,
}

impl ListenerKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListenerKind::Block => "block",
            ListenerKind::Tx => "tx",
            ListenerKind::Chaincode => "chaincode",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxMatch {
    All,
    Id(String),
}

impl TxMatch {
    /// `"all"` (any case) becomes [`TxMatch::All`].
    pub fn parse(tx_id: &str) -> Result<Self, EventHubError> {
        if tx_id.is_empty() {
            return Err(EventHubError::MissingParameter("txid"));
        }
        if tx_id.eq_ignore_ascii_case(ALL_TRANSACTIONS) {
            Ok(TxMatch::All)
        } else {
            Ok(TxMatch::Id(tx_id.to_string()))
        }
    }

    #[must_use]
    pub fn matches(&self, tx_id: &str) -> bool {
        match self {
            TxMatch::All => true,
            TxMatch::Id(id) => id == tx_id,
        }
    }
}

/// How a chaincode listener matches event names.
#[derive(Debug, Clone)]
pub enum EventNameMatch {
    Exact(String),
    Pattern(Regex),
}

impl EventNameMatch {
    pub fn exact(name: impl Into<String>) -> Self {
        EventNameMatch::Exact(name.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, EventHubError> {
        Regex::new(pattern)
            .map(EventNameMatch::Pattern)
            .map_err(|e| EventHubError::InvalidPattern(e.to_string()))
    }

    #[must_use]
    pub fn matches(&self, event_name: &str) -> bool {
        match self {
            EventNameMatch::Exact(name) => name == event_name,
            EventNameMatch::Pattern(re) => re.is_match(event_name),
        }
    }
}

impl fmt::Display for EventNameMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventNameMatch::Exact(name) => f.write_str(name),
            EventNameMatch::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ListenerFilter {
    Block,
    Tx(TxMatch),
    Chaincode {
        chaincode_id: String,
        event_name: EventNameMatch,
    },
}

impl ListenerFilter {
    #[must_use]
    pub fn kind(&self) -> ListenerKind {
        match self {
            ListenerFilter::Block => ListenerKind::Block,
            ListenerFilter::Tx(_) => ListenerKind::Tx,
            ListenerFilter::Chaincode { .. } => ListenerKind::Chaincode,
        }
    }

    /// Removal after the first notification when the caller did not say.
    #[must_use]
    pub fn default_unregister(&self) -> bool {
        matches!(self, ListenerFilter::Tx(TxMatch::Id(_)))
    }

    /// Whether a chaincode event is of interest. False for other kinds.
    #[must_use]
    pub fn matches_chaincode_event(&self, event: &ChaincodeEvent) -> bool {
        match self {
            ListenerFilter::Chaincode {
                chaincode_id,
                event_name,
            } => *chaincode_id == event.chaincode_id && event_name.matches(&event.event_name),
            _ => false,
        }
    }
}

/// Block window and unregister policy of a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub start_block: Option<BlockNum>,
    pub end_block: Option<BlockNum>,
    /// Remove after the first notification. Defaults to true for a
    /// specific transaction id, false otherwise.
    pub unregister: Option<bool>,
}

impl ListenerOptions {
    #[must_use]
    pub fn starting_at(mut self, block: impl Into<BlockNum>) -> Self {
        self.start_block = Some(block.into());
        self
    }

    #[must_use]
    pub fn ending_at(mut self, block: impl Into<BlockNum>) -> Self {
        self.end_block = Some(block.into());
        self
    }

    #[must_use]
    pub fn unregister(mut self, unregister: bool) -> Self {
        self.unregister = Some(unregister);
        self
    }
}

#[derive(Debug, Clone)]
pub struct EventListener {
    filter: ListenerFilter,
    start_block: Option<BlockNum>,
    end_block: Option<BlockNum>,
    unregister: bool,
}

impl EventListener {
    pub fn new(filter: ListenerFilter, options: ListenerOptions) -> Result<Self, EventHubError> {
        if let (Some(start), Some(end)) = (options.start_block, options.end_block) {
            if start > end {
                return Err(EventHubError::InvalidRange { start, end });
            }
        }
        let unregister = options
            .unregister
            .unwrap_or_else(|| filter.default_unregister());
        Ok(Self {
            filter,
            start_block: options.start_block,
            end_block: options.end_block,
            unregister,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ListenerKind {
        self.filter.kind()
    }

    #[must_use]
    pub fn filter(&self) -> &ListenerFilter {
        &self.filter
    }

    #[must_use]
    pub fn start_block(&self) -> Option<BlockNum> {
        self.start_block
    }

    #[must_use]
    pub fn end_block(&self) -> Option<BlockNum> {
        self.end_block
    }

    #[must_use]
    pub fn auto_unregister(&self) -> bool {
        self.unregister
    }

    /// True when `block` lies inside the listener's window. Unset bounds
    /// impose no constraint.
    #[must_use]
    pub fn in_range(&self, block: BlockNum) -> bool {
        self.start_block.map_or(true, |start| start <= block)
            && self.end_block.map_or(true, |end| block <= end)
    }

    #[must_use]
    pub fn is_end_block(&self, block: BlockNum) -> bool {
        self.end_block == Some(block)
    }
}
