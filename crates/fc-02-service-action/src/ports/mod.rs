//! # Ports
//!
//! Handlers that route a signed request to targets chosen on the caller's
//! behalf (for example from a discovery endorsement plan).

pub mod handlers;

pub use handlers::{CommitHandler, CommitRequest, EndorseHandler, EndorseRequest, PeerSort, QueryHandler};
