//! # Domain
//!
//! Sign state, proposal results and errors.

pub mod errors;
pub mod results;
pub mod state;

pub use errors::{ActionError, PeerFailure};
pub use results::{PeerOutcome, PeerResponse, ProposalResults};
pub use state::{ActionState, Signable};
