//! # Service
//!
//! Discoverers, per-channel discovery and the handlers that route
//! endorsements, commits and queries through discovery results.

pub mod commit;
pub mod discoverer;
pub mod discovery;
pub mod endorse;
pub mod query;
pub mod request;

#[cfg(test)]
mod testing;

pub use commit::DiscoveryCommitHandler;
pub use discoverer::Discoverer;
pub use discovery::{discovered_endpoint, ChannelDiscovery, DiscoverRequest};
pub use endorse::DiscoveryEndorseHandler;
pub use query::DiscoveryQueryHandler;
pub use request::BuildDiscoveryRequest;
