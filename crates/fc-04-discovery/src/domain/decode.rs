//! # Result Decoding
//!
//! Pure conversion of discovery result entries into [`DiscoveryResults`]
//! parts. Two failure policies apply:
//!
//! - config entries: an undecodable MSP is logged and skipped
//! - peer entries: anything undecodable, or a channel peer without a
//!   ledger height, fails the whole result
//!
//! [`DiscoveryResults`]: super::DiscoveryResults

use super::errors::DiscoveryError;
use super::results::{DiscoveredPeer, EndorsementPlan, OrdererAddress};
use fc_01_endpoint::MspInfo;
use shared_types::discovery::{
    ChaincodeQueryResult, ConfigResult, DiscoveryPeer, FabricMspConfig, GossipContent,
    GossipEnvelope, GossipMessage, PeerMembershipResult, SerializedIdentity,
};
use shared_types::{decode, BlockNum};
use std::collections::BTreeMap;
use tracing::warn;

fn pem(bytes: &[Vec<u8>]) -> Vec<String> {
    bytes
        .iter()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .collect()
}

/// MSP configs and orderer addresses. Undecodable MSP configs are dropped.
pub fn decode_config(
    result: &ConfigResult,
) -> (BTreeMap<String, MspInfo>, BTreeMap<String, Vec<OrdererAddress>>) {
    let mut msps = BTreeMap::new();
    for (id, config) in &result.msps {
        let fabric: FabricMspConfig = match decode("FabricMspConfig", &config.config) {
            Ok(fabric) => fabric,
            Err(e) => {
                warn!(msp = %id, error = %e, "skipping undecodable MSP config");
                continue;
            }
        };
        msps.insert(
            id.clone(),
            MspInfo {
                id: id.clone(),
                name: fabric.name,
                root_certs: pem(&fabric.root_certs),
                intermediate_certs: pem(&fabric.intermediate_certs),
                admins: pem(&fabric.admins),
                revocation_list: pem(&fabric.revocation_list),
                organizational_unit_identifiers: fabric
                    .organizational_unit_identifiers
                    .into_iter()
                    .map(|ou| ou.organizational_unit_identifier)
                    .collect(),
                tls_root_certs: pem(&fabric.tls_root_certs),
                tls_intermediate_certs: pem(&fabric.tls_intermediate_certs),
            },
        );
    }

    let orderers = result
        .orderers
        .iter()
        .map(|(mspid, endpoints)| {
            let addresses = endpoints
                .endpoint
                .iter()
                .map(|e| OrdererAddress::new(e.host.clone(), e.port))
                .collect();
            (mspid.clone(), addresses)
        })
        .collect();

    (msps, orderers)
}

fn gossip(peer: &str, envelope: &GossipEnvelope) -> Result<GossipContent, DiscoveryError> {
    let message: GossipMessage = decode("GossipMessage", &envelope.payload)
        .map_err(|e| DiscoveryError::invalid_peer(peer, e.to_string()))?;
    Ok(message.content)
}

/// Split an advertised `host:port`.
pub fn split_endpoint(endpoint: &str) -> Result<(String, u16), DiscoveryError> {
    let invalid = || DiscoveryError::invalid_peer(endpoint, "endpoint is not host:port");
    let (host, port) = endpoint.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

/// Decode one peer. Channel peers (`require_state`) must carry state info
/// with a ledger height.
pub fn decode_peer(peer: &DiscoveryPeer, require_state: bool) -> Result<DiscoveredPeer, DiscoveryError> {
    let identity: SerializedIdentity = decode("SerializedIdentity", &peer.identity)?;
    let mspid = identity.mspid;

    let membership = peer
        .membership_info
        .as_ref()
        .ok_or_else(|| DiscoveryError::invalid_peer(&mspid, "missing membership info"))?;
    let endpoint = match gossip(&mspid, membership)? {
        GossipContent::AliveMsg(alive) => alive.membership.endpoint,
        _ => return Err(DiscoveryError::invalid_peer(&mspid, "membership info is not an alive message")),
    };
    let (host, port) = split_endpoint(&endpoint)?;

    let (ledger_height, chaincodes) = match &peer.state_info {
        Some(state) => match gossip(&endpoint, state)? {
            GossipContent::StateInfo(info) => {
                let properties = info
                    .properties
                    .ok_or_else(|| DiscoveryError::invalid_peer(&endpoint, "missing ledger height"))?;
                (Some(BlockNum::new(properties.ledger_height)), properties.chaincodes)
            }
            _ => return Err(DiscoveryError::invalid_peer(&endpoint, "state info is not a state message")),
        },
        None if require_state => {
            return Err(DiscoveryError::invalid_peer(&endpoint, "missing state info"));
        }
        None => (None, Vec::new()),
    };

    Ok(DiscoveredPeer {
        name: endpoint,
        mspid,
        host,
        port,
        ledger_height,
        chaincodes,
    })
}

/// Peers per organization.
pub fn decode_members(
    result: &PeerMembershipResult,
    require_state: bool,
) -> Result<BTreeMap<String, Vec<DiscoveredPeer>>, DiscoveryError> {
    result
        .peers_by_org
        .iter()
        .map(|(org, peers)| {
            let peers = peers
                .peers
                .iter()
                .map(|p| decode_peer(p, require_state))
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, DiscoveryError>((org.clone(), peers))
        })
        .collect()
}

/// The single endorsement plan of a chaincode query result.
pub fn decode_plan(result: &ChaincodeQueryResult) -> Result<EndorsementPlan, DiscoveryError> {
    let [descriptor] = result.content.as_slice() else {
        return Err(DiscoveryError::InvalidLayouts);
    };
    let groups = descriptor
        .endorsers_by_groups
        .iter()
        .map(|(group, peers)| {
            let peers = peers
                .peers
                .iter()
                .map(|p| decode_peer(p, true))
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, DiscoveryError>((group.clone(), peers))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(EndorsementPlan {
        chaincode: descriptor.chaincode.clone(),
        groups,
        layouts: descriptor
            .layouts
            .iter()
            .map(|l| l.quantities_by_group.clone())
            .collect(),
    })
}
