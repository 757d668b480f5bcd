//! # Discovery Request
//!
//! Composes the query list of one discovery request:
//!
//! ```text
//! [config?] [members] [chaincode? (interest)] [local peers?]
//! ```
//!
//! Result entries answer queries positionally, so the query kinds are kept
//! alongside the payload for response processing.

use crate::domain::DiscoveryError;
use fc_02_service_action::Proposal;
use shared_crypto::IdentityContext;
use shared_types::discovery::{AuthInfo, ChaincodeInterest, DiscoveryRequest, Query, QueryKind};
use shared_types::encode;

/// What to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDiscoveryRequest {
    /// Channel MSPs and orderers.
    pub config: bool,
    /// Membership as seen by the answering peer.
    pub local: bool,
    /// Chaincodes whose endorsement plan is wanted. Empty skips the
    /// chaincode query.
    pub interest: Vec<ChaincodeInterest>,
}

impl Default for BuildDiscoveryRequest {
    fn default() -> Self {
        Self {
            config: true,
            local: false,
            interest: Vec::new(),
        }
    }
}

impl BuildDiscoveryRequest {
    pub fn for_interest(interest: ChaincodeInterest) -> Self {
        Self {
            interest: vec![interest],
            ..Self::default()
        }
    }

    /// Ask for the plan covering everything `proposal` touches.
    pub fn for_proposal(proposal: &Proposal) -> Self {
        Self::for_interest(proposal.build_proposal_interest())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueryTag {
    Config,
    Members,
    Chaincode,
    LocalPeers,
}

pub(crate) struct BuiltRequest {
    pub payload: Vec<u8>,
    pub tags: Vec<QueryTag>,
}

pub(crate) fn build_request(
    identity: &dyn IdentityContext,
    channel: &str,
    request: &BuildDiscoveryRequest,
) -> Result<BuiltRequest, DiscoveryError> {
    if channel.is_empty() {
        return Err(DiscoveryError::MissingParameter("channel"));
    }

    let mut queries = Vec::new();
    let mut tags = Vec::new();
    let mut push = |kind: QueryKind, tag: QueryTag, channel: &str| {
        queries.push(Query {
            channel: channel.to_string(),
            query: kind,
        });
        tags.push(tag);
    };

    if request.config {
        push(QueryKind::ConfigQuery, QueryTag::Config, channel);
    }
    push(QueryKind::PeerQuery, QueryTag::Members, channel);
    if !request.interest.is_empty() {
        push(
            QueryKind::CcQuery {
                interests: request.interest.clone(),
            },
            QueryTag::Chaincode,
            channel,
        );
    }
    if request.local {
        push(QueryKind::LocalPeers, QueryTag::LocalPeers, "");
    }

    let discovery_request = DiscoveryRequest {
        authentication: Some(AuthInfo {
            client_identity: identity.serialize_identity()?,
            client_tls_cert_hash: identity.client_cert_hash().unwrap_or_default(),
        }),
        queries,
    };
    Ok(BuiltRequest {
        payload: encode("DiscoveryRequest", &discovery_request)?,
        tags,
    })
}
