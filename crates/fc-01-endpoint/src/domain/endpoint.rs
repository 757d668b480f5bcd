//! # Endpoint
//!
//! Address and connection options of one remote service.

use super::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(3_000);

/// Default time allowed for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(45_000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Grpc,
    #[default]
    Grpcs,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Grpc => "grpc",
            Protocol::Grpcs => "grpcs",
        }
    }

    #[must_use]
    pub fn is_tls(self) -> bool {
        self == Protocol::Grpcs
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grpc" => Ok(Protocol::Grpc),
            "grpcs" => Ok(Protocol::Grpcs),
            other => Err(ServiceError::InvalidUrl(format!("unknown protocol {other}"))),
        }
    }
}

/// Timeouts applied by a service endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointOptions {
    #[serde(with = "millis")]
    pub connect_timeout: Duration,
    #[serde(with = "millis")]
    pub request_timeout: Duration,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A resolved remote address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// PEM trust roots for TLS connections.
    pub tls_root_certs: Vec<u8>,
    /// Host name to verify the server certificate against.
    pub ssl_target_name_override: Option<String>,
    pub options: EndpointOptions,
}

impl Endpoint {
    pub fn new(protocol: Protocol, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol,
            host: host.into(),
            port,
            tls_root_certs: Vec::new(),
            ssl_target_name_override: None,
            options: EndpointOptions::default(),
        }
    }

    /// Parse `grpc://host:port` or `grpcs://host:port`.
    pub fn parse(url: &str) -> Result<Self, ServiceError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ServiceError::InvalidUrl(url.to_string()))?;
        let protocol: Protocol = scheme.parse()?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| ServiceError::InvalidUrl(url.to_string()))?;
        if host.is_empty() {
            return Err(ServiceError::InvalidUrl(url.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ServiceError::InvalidUrl(url.to_string()))?;
        Ok(Self::new(protocol, host, port))
    }

    #[must_use]
    pub fn with_options(mut self, options: EndpointOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_tls_root_certs(mut self, pem: Vec<u8>) -> Self {
        self.tls_root_certs = pem;
        self
    }

    #[must_use]
    pub fn with_ssl_target_name_override(mut self, host: impl Into<String>) -> Self {
        self.ssl_target_name_override = Some(host.into());
        self
    }

    /// `protocol://host:port`
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// `host:port`
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.protocol.is_tls()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// Serialize a `Duration` as integer milliseconds.
pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
