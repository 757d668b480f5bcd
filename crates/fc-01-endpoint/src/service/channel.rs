//! # Channel
//!
//! Registry of the endorsing peers, orderers and MSP configs known for one
//! channel. Discovery populates it; handlers read from it.

use super::orderer::Orderer;
use super::peer::Peer;
use super::service_endpoint::Connectable;
use crate::domain::{MspInfo, ServiceError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct Channel {
    name: String,
    endorsers: RwLock<BTreeMap<String, Arc<Peer>>>,
    committers: RwLock<BTreeMap<String, Arc<Orderer>>>,
    msps: RwLock<BTreeMap<String, MspInfo>>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Result<Self, ServiceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ServiceError::MissingParameter("channel name"));
        }
        Ok(Self {
            name,
            endorsers: RwLock::new(BTreeMap::new()),
            committers: RwLock::new(BTreeMap::new()),
            msps: RwLock::new(BTreeMap::new()),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -------------------------------------------------------------------------
    // Endorsers
    // -------------------------------------------------------------------------

    /// Add a peer keyed by its name. Fails on a duplicate unless `replace`.
    pub fn add_endorser(&self, peer: Arc<Peer>, replace: bool) -> Result<(), ServiceError> {
        let name = peer.name().to_string();
        let mut endorsers = self.endorsers.write();
        if endorsers.contains_key(&name) && !replace {
            return Err(ServiceError::Duplicate {
                kind: "Peer",
                name,
            });
        }
        debug!(channel = %self.name, peer = %name, "endorser added");
        endorsers.insert(name, peer);
        Ok(())
    }

    #[must_use]
    pub fn get_endorser(&self, name: &str) -> Option<Arc<Peer>> {
        self.endorsers.read().get(name).cloned()
    }

    /// All endorsers, or only those of `mspid`.
    #[must_use]
    pub fn get_endorsers(&self, mspid: Option<&str>) -> Vec<Arc<Peer>> {
        self.endorsers
            .read()
            .values()
            .filter(|peer| mspid.is_none() || peer.mspid() == mspid)
            .cloned()
            .collect()
    }

    pub fn remove_endorser(&self, name: &str) -> Option<Arc<Peer>> {
        self.endorsers.write().remove(name)
    }

    // -------------------------------------------------------------------------
    // Committers
    // -------------------------------------------------------------------------

    /// Add an orderer keyed by its name. Fails on a duplicate unless `replace`.
    pub fn add_committer(&self, orderer: Arc<Orderer>, replace: bool) -> Result<(), ServiceError> {
        let name = orderer.name().to_string();
        let mut committers = self.committers.write();
        if committers.contains_key(&name) && !replace {
            return Err(ServiceError::Duplicate {
                kind: "Orderer",
                name,
            });
        }
        debug!(channel = %self.name, orderer = %name, "committer added");
        committers.insert(name, orderer);
        Ok(())
    }

    #[must_use]
    pub fn get_committer(&self, name: &str) -> Option<Arc<Orderer>> {
        self.committers.read().get(name).cloned()
    }

    /// All orderers, or only those of `mspid`.
    #[must_use]
    pub fn get_committers(&self, mspid: Option<&str>) -> Vec<Arc<Orderer>> {
        self.committers
            .read()
            .values()
            .filter(|orderer| mspid.is_none() || orderer.mspid() == mspid)
            .cloned()
            .collect()
    }

    pub fn remove_committer(&self, name: &str) -> Option<Arc<Orderer>> {
        self.committers.write().remove(name)
    }

    // -------------------------------------------------------------------------
    // MSPs
    // -------------------------------------------------------------------------

    pub fn add_msp(&self, msp: MspInfo, replace: bool) -> Result<(), ServiceError> {
        let mut msps = self.msps.write();
        if msps.contains_key(&msp.id) && !replace {
            return Err(ServiceError::Duplicate {
                kind: "MSP",
                name: msp.id,
            });
        }
        msps.insert(msp.id.clone(), msp);
        Ok(())
    }

    #[must_use]
    pub fn get_msp(&self, id: &str) -> Option<MspInfo> {
        self.msps.read().get(id).cloned()
    }

    #[must_use]
    pub fn msp_ids(&self) -> Vec<String> {
        self.msps.read().keys().cloned().collect()
    }

    /// Disconnect every registered peer and orderer.
    pub fn close(&self) {
        for peer in self.endorsers.read().values() {
            peer.disconnect();
        }
        for orderer in self.committers.read().values() {
            orderer.disconnect();
        }
        debug!(channel = %self.name, "channel closed");
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("endorsers", &self.endorsers.read().len())
            .field("committers", &self.committers.read().len())
            .field("msps", &self.msps.read().len())
            .finish()
    }
}
