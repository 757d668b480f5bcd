//! # FC Client
//!
//! Application-facing entry point: configuration, logging and the
//! [`Client`] factory.
//!
//! ## Usage
//!
//! ```text
//! let config = ClientConfig::load("client.toml")?;      // TOML + FC_* overrides
//! telemetry::init_tracing(&config.logging)?;
//! let client = Client::new(config, identity, connectors);
//!
//! let discoverer = client.discoverer("peer0", "grpcs://peer0.org1:7051", mspid).await?;
//! let discovery = client.channel_discovery("disc", "mychannel")?;
//! let hub = client.event_hub("hub", "mychannel")?;
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! fc-client/
//! ├── config.rs     # ClientConfig, LoggingConfig, ConfigError, env overrides
//! ├── telemetry.rs  # init_tracing
//! └── client.rs     # Client
//! ```

#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod client;
pub mod config;
pub mod telemetry;

// Re-exports
pub use client::Client;
pub use config::{ClientConfig, ConfigError, LoggingConfig};
pub use telemetry::init_tracing;

// Component crates, so applications depend on this crate alone.
pub use fc_01_endpoint as endpoint;
pub use fc_02_service_action as action;
pub use fc_03_event_hub as event_hub;
pub use fc_04_discovery as discovery;
pub use shared_crypto as crypto;
pub use shared_types as types;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
