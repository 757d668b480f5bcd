//! # Client
//!
//! Holds the configuration, the signing identity and the transport
//! connectors, and hands out connected service nodes plus per-channel
//! event hubs and discovery.
//!
//! ```text
//! Client
//! ├── channel(name)            → Arc<Channel> (one per name)
//! ├── peer / orderer (url)     → connected, endpoint options applied
//! ├── eventer / discoverer     → connected, endpoint options applied
//! ├── event_hub(name, channel) → EventHub with [event_hub] config
//! └── channel_discovery(...)   → Arc<ChannelDiscovery> with [discovery] config
//! ```

use crate::config::ClientConfig;
use fc_01_endpoint::{Channel, Connectors, Endpoint, Orderer, Peer, ServiceError};
use fc_03_event_hub::{EventHub, EventHubError, Eventer};
use fc_04_discovery::{ChannelDiscovery, Discoverer};
use parking_lot::Mutex;
use shared_crypto::IdentityContext;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Client {
    config: ClientConfig,
    identity: Arc<dyn IdentityContext>,
    connectors: Connectors,
    channels: Mutex<HashMap<String, Arc<Channel>>>,
}

impl Client {
    pub fn new(config: ClientConfig, identity: Arc<dyn IdentityContext>, connectors: Connectors) -> Self {
        info!(mspid = %identity.mspid(), "client created");
        Self {
            config,
            identity,
            connectors,
            channels: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityContext {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn connectors(&self) -> &Connectors {
        &self.connectors
    }

    /// The channel named `name`, created on first use.
    pub fn channel(&self, name: &str) -> Result<Arc<Channel>, ServiceError> {
        let mut channels = self.channels.lock();
        if let Some(channel) = channels.get(name) {
            return Ok(channel.clone());
        }
        let channel = Arc::new(Channel::new(name)?);
        channels.insert(name.to_string(), channel.clone());
        debug!(channel = %name, "channel created");
        Ok(channel)
    }

    /// Close every channel and forget them.
    pub fn close(&self) {
        let channels: Vec<_> = self.channels.lock().drain().map(|(_, c)| c).collect();
        for channel in channels {
            channel.close();
        }
    }

    fn endpoint(&self, url: &str) -> Result<Endpoint, ServiceError> {
        Ok(Endpoint::parse(url)?.with_options(self.config.endpoint))
    }

    pub async fn peer(&self, name: &str, url: &str, mspid: Option<String>) -> Result<Arc<Peer>, ServiceError> {
        let peer = Peer::new(name, mspid);
        peer.connect(self.endpoint(url)?, self.connectors.endorser.as_ref())
            .await?;
        Ok(Arc::new(peer))
    }

    pub async fn orderer(
        &self,
        name: &str,
        url: &str,
        mspid: Option<String>,
    ) -> Result<Arc<Orderer>, ServiceError> {
        let orderer = Orderer::new(name, mspid);
        orderer
            .connect(self.endpoint(url)?, self.connectors.broadcast.as_ref())
            .await?;
        Ok(Arc::new(orderer))
    }

    pub async fn eventer(&self, name: &str, url: &str, mspid: Option<String>) -> Result<Arc<Eventer>, ServiceError> {
        let eventer = Eventer::new(name, mspid);
        eventer
            .connect(self.endpoint(url)?, self.connectors.deliver.clone())
            .await?;
        Ok(Arc::new(eventer))
    }

    pub async fn discoverer(
        &self,
        name: &str,
        url: &str,
        mspid: Option<String>,
    ) -> Result<Arc<Discoverer>, ServiceError> {
        let discoverer = Discoverer::new(name, mspid);
        discoverer
            .connect(self.endpoint(url)?, self.connectors.discovery.as_ref())
            .await?;
        Ok(Arc::new(discoverer))
    }

    pub fn event_hub(&self, name: &str, channel: &str) -> Result<EventHub, EventHubError> {
        EventHub::new(name, channel, self.config.event_hub)
    }

    pub fn channel_discovery(&self, name: &str, channel: &str) -> Result<Arc<ChannelDiscovery>, ServiceError> {
        let channel = self.channel(channel)?;
        Ok(Arc::new(ChannelDiscovery::new(
            name,
            channel,
            &self.connectors,
            self.config.discovery,
        )))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("mspid", &self.identity.mspid())
            .field("channels", &self.channels.lock().len())
            .finish()
    }
}
