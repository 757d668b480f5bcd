//! # Ports
//!
//! Listener-facing output of the hub. The inbound side (delivery streams)
//! is the `DeliverClient` port of `fc-01-endpoint`.

pub mod sink;

pub use sink::{ChannelSink, ListenerSink};
