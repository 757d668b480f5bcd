//! # FC-04 Discovery
//!
//! Channel discovery and discovery-driven routing of service actions.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! A [`ChannelDiscovery`] sends one signed request to the first
//! [`Discoverer`] that answers and turns the response into cached
//! [`DiscoveryResults`]:
//!
//! - channel MSPs and orderer endpoints (config query)
//! - channel members with ledger height and installed chaincodes
//! - an [`EndorsementPlan`] for a chaincode interest
//! - local peers of the discoverer's organization
//!
//! Discovered peers and orderers are connected and added to the channel.
//! The cached results are refreshed once older than the refresh age.
//!
//! The three handlers plug discovery into service actions:
//!
//! ```text
//! Endorsement.send(Targets::Handler) ──→ DiscoveryEndorseHandler  plan layouts in order
//! Commit.send(CommitTargets::Handler) ─→ DiscoveryCommitHandler   orderers until accepted
//! Query.send(Targets::Handler) ────────→ DiscoveryQueryHandler    every channel peer
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! fc-04-discovery/
//! ├── domain/      # DiscoveryResults, decoding, DiscoveryConfig, DiscoveryError
//! └── service/     # Discoverer, ChannelDiscovery, request building, handlers
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod service;

// Re-exports
pub use domain::{
    DiscoveredPeer, DiscoveryConfig, DiscoveryError, DiscoveryResults, EndorsementPlan,
    OrdererAddress, DEFAULT_REFRESH_AGE_MS,
};
pub use service::{
    discovered_endpoint, BuildDiscoveryRequest, ChannelDiscovery, DiscoverRequest, Discoverer,
    DiscoveryCommitHandler, DiscoveryEndorseHandler, DiscoveryQueryHandler,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
