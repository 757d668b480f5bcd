//! # Domain
//!
//! Discovery results, their decoding, configuration and errors.

pub mod config;
pub mod decode;
pub mod errors;
pub mod results;

pub use config::{DiscoveryConfig, DEFAULT_REFRESH_AGE_MS};
pub use decode::{decode_config, decode_members, decode_peer, decode_plan, split_endpoint};
pub use errors::DiscoveryError;
pub use results::{DiscoveredPeer, DiscoveryResults, EndorsementPlan, OrdererAddress};
