//! # Discovery Protocol Messages
//!
//! Requests and responses of the peer discovery service together with the
//! gossip and MSP payloads embedded in them.
//!
//! ```text
//! SignedRequest ── DiscoveryRequest ── [Query { channel, ConfigQuery | PeerQuery
//!                                                       | LocalPeers | CcQuery }]
//! DiscoveryResponse ── [QueryResult { Error | ConfigResult | Members | CcQueryRes }]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MSP
// =============================================================================

/// Identity as carried on the wire: owning MSP plus the certificate bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    pub mspid: String,
    pub id_bytes: Vec<u8>,
}

/// Organizational unit identifier of an MSP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalUnitIdentifier {
    pub certificate: Vec<u8>,
    pub organizational_unit_identifier: String,
}

/// Trust roots and admins of one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricMspConfig {
    pub name: String,
    pub root_certs: Vec<Vec<u8>>,
    pub intermediate_certs: Vec<Vec<u8>>,
    pub admins: Vec<Vec<u8>>,
    pub revocation_list: Vec<Vec<u8>>,
    pub organizational_unit_identifiers: Vec<OrganizationalUnitIdentifier>,
    pub tls_root_certs: Vec<Vec<u8>>,
    pub tls_intermediate_certs: Vec<Vec<u8>>,
}

/// Typed MSP config container. `config` holds an encoded [`FabricMspConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspConfig {
    pub msp_type: i32,
    pub config: Vec<u8>,
}

// =============================================================================
// GOSSIP
// =============================================================================

/// Signed gossip message. `payload` holds an encoded [`GossipMessage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipEnvelope {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipMessage {
    pub nonce: u64,
    pub channel: Vec<u8>,
    pub content: GossipContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GossipContent {
    AliveMsg(AliveMessage),
    StateInfo(StateInfo),
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// `host:port` the peer advertises.
    pub endpoint: String,
    pub pki_id: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveMessage {
    pub membership: Member,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub pki_id: Vec<u8>,
    pub channel_mac: Vec<u8>,
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    pub ledger_height: u64,
    pub left_channel: bool,
    pub chaincodes: Vec<InstalledChaincode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledChaincode {
    pub name: String,
    pub version: String,
}

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// Encoded [`SerializedIdentity`] of the caller.
    pub client_identity: Vec<u8>,
    pub client_tls_cert_hash: Vec<u8>,
}

/// A chaincode (and its collections) taking part in an invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeCall {
    pub name: String,
    pub collection_names: Vec<String>,
    pub no_private_reads: bool,
}

impl ChaincodeCall {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Chaincodes whose combined endorsement policy is asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeInterest {
    pub chaincodes: Vec<ChaincodeCall>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryKind {
    ConfigQuery,
    PeerQuery,
    /// Membership as seen by the local peer; not channel scoped.
    LocalPeers,
    CcQuery { interests: Vec<ChaincodeInterest> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Empty for [`QueryKind::LocalPeers`].
    pub channel: String,
    pub query: QueryKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub authentication: Option<AuthInfo>,
    pub queries: Vec<Query>,
}

/// Discovery request bytes plus the caller's signature over them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Encoded [`DiscoveryRequest`].
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

// =============================================================================
// RESPONSE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdererEndpoint {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub endpoint: Vec<OrdererEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigResult {
    pub msps: BTreeMap<String, MspConfig>,
    /// Orderer endpoints keyed by owning MSP id.
    pub orderers: BTreeMap<String, Endpoints>,
}

/// A peer as reported by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPeer {
    pub state_info: Option<GossipEnvelope>,
    pub membership_info: Option<GossipEnvelope>,
    /// Encoded [`SerializedIdentity`].
    pub identity: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peers {
    pub peers: Vec<DiscoveryPeer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMembershipResult {
    pub peers_by_org: BTreeMap<String, Peers>,
}

/// Required endorser count per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub quantities_by_group: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementDescriptor {
    pub chaincode: String,
    pub endorsers_by_groups: BTreeMap<String, Peers>,
    pub layouts: Vec<Layout>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeQueryResult {
    pub content: Vec<EndorsementDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryResult {
    Error { content: String },
    ConfigResult(ConfigResult),
    Members(PeerMembershipResult),
    CcQueryRes(ChaincodeQueryResult),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub results: Vec<QueryResult>,
}
