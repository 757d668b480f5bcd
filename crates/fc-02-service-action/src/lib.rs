//! # FC-02 Service Action
//!
//! Build, sign and send lifecycle of every request a client makes.
//!
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! A request is built into payload bytes, signed (by an
//! [`IdentityContext`](shared_crypto::IdentityContext) or with an externally
//! computed signature) and then sent either to explicit targets or through a
//! handler that picks targets itself. Proposals come in two flavours:
//! [`Endorsement`] feeds a [`Commit`], [`Query`] only reads.
//!
//! ## Module Structure
//!
//! ```text
//! fc-02-service-action/
//! ├── domain/      # ActionState, Signable, ProposalResults, ActionError
//! ├── ports/       # EndorseHandler, QueryHandler, CommitHandler + request options
//! └── service/     # Proposal, Endorsement, Query, Commit, header helpers
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    ActionError, ActionState, PeerFailure, PeerOutcome, PeerResponse, ProposalResults, Signable,
};
pub use ports::{
    CommitHandler, CommitRequest, EndorseHandler, EndorseRequest, PeerSort, QueryHandler,
};
pub use service::{
    broadcast_first_success, BuildProposalRequest, Commit, CommitTargets, Endorsement, Proposal,
    ProposalKind, Query, Targets,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
