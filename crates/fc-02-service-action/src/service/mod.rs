//! Proposal, commit and header assembly.

pub mod commit;
pub mod header;
pub mod proposal;

pub use commit::{broadcast_first_success, Commit, CommitTargets};
pub use header::{channel_header, header, now_timestamp};
pub use proposal::{BuildProposalRequest, Endorsement, Proposal, ProposalKind, Query, Targets};
