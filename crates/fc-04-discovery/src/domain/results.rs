//! # Discovery Results
//!
//! The decoded result tree of one discovery round-trip. A new round-trip
//! replaces the whole tree.

use fc_01_endpoint::MspInfo;
use shared_types::discovery::InstalledChaincode;
use shared_types::BlockNum;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// A peer as discovery described it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeer {
    /// Advertised `host:port`; also the name of the client-side peer.
    pub name: String,
    pub mspid: String,
    pub host: String,
    pub port: u16,
    /// Absent only for local peers, which report no state.
    pub ledger_height: Option<BlockNum>,
    pub chaincodes: Vec<InstalledChaincode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdererAddress {
    /// `host:port`; also the name of the client-side orderer.
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl OrdererAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            name: format!("{host}:{port}"),
            host,
            port,
        }
    }
}

/// Which peers may endorse: named groups of peers and the layouts (group
/// to required count) that satisfy the chaincode's policy, in preference
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndorsementPlan {
    pub chaincode: String,
    pub groups: BTreeMap<String, Vec<DiscoveredPeer>>,
    pub layouts: Vec<BTreeMap<String, u32>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryResults {
    /// When the round-trip that produced this tree completed.
    pub timestamp: Instant,
    pub msps: BTreeMap<String, MspInfo>,
    /// Orderer addresses keyed by owning MSP id.
    pub orderers: BTreeMap<String, Vec<OrdererAddress>>,
    pub peers_by_org: BTreeMap<String, Vec<DiscoveredPeer>>,
    /// Membership as seen by the answering peer, when asked for.
    pub local_peers: BTreeMap<String, Vec<DiscoveredPeer>>,
    pub endorsement_plan: Option<EndorsementPlan>,
}

impl DiscoveryResults {
    pub fn empty(timestamp: Instant) -> Self {
        Self {
            timestamp,
            msps: BTreeMap::new(),
            orderers: BTreeMap::new(),
            peers_by_org: BTreeMap::new(),
            local_peers: BTreeMap::new(),
            endorsement_plan: None,
        }
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }

    /// Older than `refresh_age`.
    #[must_use]
    pub fn is_stale(&self, refresh_age: Duration) -> bool {
        self.age() > refresh_age
    }

    /// Channel peers of every organization.
    pub fn peers(&self) -> impl Iterator<Item = &DiscoveredPeer> + '_ {
        self.peers_by_org.values().flatten()
    }
}
