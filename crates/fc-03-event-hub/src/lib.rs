//! # FC-03 Event Hub
//!
//! Block, transaction and chaincode event subscriptions over one delivery
//! stream per hub.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! An [`EventHub`] builds and signs a seek request, starts a delivery stream
//! on the first [`Eventer`] that answers before the setup timer, and fans
//! every received block out to the registered listeners:
//!
//! - block listeners receive every block in their window
//! - transaction listeners receive matching transactions with their
//!   validation code
//! - chaincode listeners receive all matching events of a block in one batch
//!
//! Every listener still registered when the stream stops receives exactly one
//! [`Termination`], whatever the cause.
//!
//! ## Module Structure
//!
//! ```text
//! fc-03-event-hub/
//! ├── domain/      # EventListener, filters, BlockEvent, Termination, seek planning
//! ├── ports/       # ListenerSink, ChannelSink
//! └── service/     # EventHub, Eventer, ListenerRegistry, dispatch passes
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    plan_seek, BlockEvent, Delivery, EventHubConfig, EventHubError, EventListener,
    EventNameMatch, ListenerFilter, ListenerHandle, ListenerKind, ListenerOptions, SeekPlan,
    Termination, TerminationKind, TxMatch, ALL_TRANSACTIONS,
};
pub use ports::{ChannelSink, ListenerSink};
pub use service::{EventHub, Eventer, SendRequest, StartRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
