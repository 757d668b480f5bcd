//! # Ports
//!
//! Transport boundary. Everything that talks to the network sits behind one
//! of these traits.

pub mod outbound;

pub use outbound::{
    BroadcastClient, Connector, Connectors, DeliverClient, DeliverStream, DiscoveryClient,
    EndorserClient, RemoteService, StreamEvent,
};
