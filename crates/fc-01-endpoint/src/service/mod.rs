//! # Service
//!
//! Connected remotes and the channel registry that owns them.

pub mod channel;
pub mod orderer;
pub mod peer;
pub mod service_endpoint;

pub use channel::Channel;
pub use orderer::Orderer;
pub use peer::Peer;
pub use service_endpoint::{Connectable, HasEndpoint, ServiceEndpoint};
