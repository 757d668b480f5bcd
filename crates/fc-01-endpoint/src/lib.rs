//! # FC-01 Endpoint
//!
//! Connection lifecycle of remote services and the objects built on it.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! Every component of the client talks to the network through a
//! [`ServiceEndpoint`]: a named, optionally MSP-scoped wrapper that connects
//! a service client through a [`Connector`], waits for readiness, runs each
//! request under its own timer and tags every failure with the remote's
//! [`ConnectionInfo`](shared_types::ConnectionInfo).
//!
//! ## Module Structure
//!
//! ```text
//! fc-01-endpoint/
//! ├── domain/      # Endpoint, EndpointOptions, MspInfo, ServiceError
//! ├── ports/       # RemoteService, Endorser/Broadcast/Deliver/DiscoveryClient, Connector
//! ├── service/     # ServiceEndpoint, Connectable, Peer, Orderer, Channel
//! └── adapters/    # Mock transports (feature `test-utils`)
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::endpoint::millis;
pub use domain::{Endpoint, EndpointOptions, MspInfo, Protocol, ServiceError, TransportError};
pub use ports::{
    BroadcastClient, Connector, Connectors, DeliverClient, DeliverStream, DiscoveryClient,
    EndorserClient, RemoteService, StreamEvent,
};
pub use service::{Channel, Connectable, HasEndpoint, Orderer, Peer, ServiceEndpoint};

#[cfg(feature = "test-utils")]
pub use adapters::mock::{
    proposal_response, DeliverFeed, MockBroadcast, MockConnector, MockDeliver, MockDiscovery,
    MockEndorser,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
