//! # Service Endpoint
//!
//! Connection lifecycle of a single remote service:
//!
//! ```text
//! detached ──connect(endpoint)──> connecting ──wait_for_ready──> connected
//!     ^                                │ timeout / failure           │
//!     └────────────────────────────────┴──────────disconnect()───────┘
//! ```
//!
//! Every request made through [`ServiceEndpoint::call`] runs under its own
//! timer; expiry is reported as a `REQUEST_TIMEOUT` error carrying the
//! endpoint's connection characteristics.

use crate::domain::{Endpoint, ServiceError, TransportError};
use crate::ports::{Connector, RemoteService};
use parking_lot::RwLock;
use shared_types::ConnectionInfo;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

struct State<C: ?Sized> {
    endpoint: Option<Endpoint>,
    service: Option<Arc<C>>,
}

/// Connection wrapper around one service client.
pub struct ServiceEndpoint<C: ?Sized> {
    name: String,
    kind: &'static str,
    mspid: Option<String>,
    state: RwLock<State<C>>,
}

impl<C: ?Sized + RemoteService> ServiceEndpoint<C> {
    /// A detached endpoint. `kind` names the service in logs.
    pub fn new(name: impl Into<String>, kind: &'static str, mspid: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            mspid,
            state: RwLock::new(State {
                endpoint: None,
                service: None,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn mspid(&self) -> Option<&str> {
        self.mspid.as_deref()
    }

    /// Endpoint last assigned by [`connect`](Self::connect).
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.state.read().endpoint.clone()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.read().service.is_some()
    }

    /// Whether the endpoint was configured for TLS.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        self.state
            .read()
            .endpoint
            .as_ref()
            .is_some_and(Endpoint::is_tls)
    }

    #[must_use]
    pub fn connection_info(&self) -> ConnectionInfo {
        let url = self
            .state
            .read()
            .endpoint
            .as_ref()
            .map(Endpoint::url)
            .unwrap_or_default();
        self.connection_for(url)
    }

    fn connection_for(&self, url: String) -> ConnectionInfo {
        let info = ConnectionInfo::new(self.name.clone(), url);
        match &self.mspid {
            Some(mspid) => info.with_mspid(mspid.clone()),
            None => info,
        }
    }

    /// Open the service client and wait until it is ready.
    ///
    /// Both steps share the endpoint's connect timeout.
    pub async fn connect(
        &self,
        endpoint: Endpoint,
        connector: &dyn Connector<C>,
    ) -> Result<(), ServiceError> {
        let connection = self.connection_for(endpoint.url());
        if self.is_connected() {
            return Err(ServiceError::AlreadyConnected { connection });
        }

        let limit = endpoint.options.connect_timeout;
        debug!(service = self.kind, endpoint = %connection, "connecting");

        let service = match tokio::time::timeout(limit, connector.connect(&endpoint)).await {
            Ok(Ok(service)) => service,
            Ok(Err(e)) => {
                warn!(service = self.kind, endpoint = %connection, error = %e, "connect failed");
                return Err(ServiceError::ConnectFailed {
                    connection,
                    reason: e.0,
                });
            }
            Err(_) => return Err(timeout_error(connection, "connect", limit)),
        };

        match tokio::time::timeout(limit, service.wait_for_ready()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                service.close();
                return Err(ServiceError::ConnectFailed {
                    connection,
                    reason: e.0,
                });
            }
            Err(_) => {
                service.close();
                return Err(timeout_error(connection, "waitForReady", limit));
            }
        }

        let mut state = self.state.write();
        state.endpoint = Some(endpoint);
        state.service = Some(service);
        debug!(service = self.kind, endpoint = %connection, "connected");
        Ok(())
    }

    /// Re-check readiness of an established connection.
    pub async fn check_connection(&self) -> bool {
        let Some((service, limit)) = self.service_and_limit() else {
            return false;
        };
        matches!(
            tokio::time::timeout(limit, service.wait_for_ready()).await,
            Ok(Ok(()))
        )
    }

    fn service_and_limit(&self) -> Option<(Arc<C>, Duration)> {
        let state = self.state.read();
        let service = state.service.clone()?;
        let limit = state
            .endpoint
            .as_ref()
            .map(|e| e.options.connect_timeout)
            .unwrap_or(crate::domain::endpoint::DEFAULT_CONNECT_TIMEOUT);
        Some((service, limit))
    }

    /// Close the service client. The endpoint is kept.
    pub fn disconnect(&self) {
        let service = self.state.write().service.take();
        if let Some(service) = service {
            service.close();
            debug!(service = self.kind, name = %self.name, "disconnected");
        }
    }

    /// The connected service client.
    pub fn service(&self) -> Result<Arc<C>, ServiceError> {
        let service = self.state.read().service.clone();
        service.ok_or_else(|| ServiceError::NotConnected {
            connection: self.connection_info(),
        })
    }

    /// `timeout` if given, else the endpoint's request timeout.
    #[must_use]
    pub fn request_timeout(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or_else(|| {
            self.state
                .read()
                .endpoint
                .as_ref()
                .map(|e| e.options.request_timeout)
                .unwrap_or(crate::domain::endpoint::DEFAULT_REQUEST_TIMEOUT)
        })
    }

    /// Run one request against the service client under a fresh timer.
    pub async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        timeout: Option<Duration>,
        request: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let service = self.service()?;
        let limit = self.request_timeout(timeout);
        match tokio::time::timeout(limit, request(service)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ServiceError::Transport {
                connection: self.connection_info(),
                operation,
                reason: e.0,
            }),
            Err(_) => {
                warn!(service = self.kind, name = %self.name, operation, "request timed out");
                Err(timeout_error(self.connection_info(), operation, limit))
            }
        }
    }
}

fn timeout_error(connection: ConnectionInfo, operation: &'static str, limit: Duration) -> ServiceError {
    ServiceError::Timeout {
        connection,
        operation,
        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Anything wrapping a [`ServiceEndpoint`].
pub trait HasEndpoint {
    type Client: ?Sized + RemoteService;

    fn service_endpoint(&self) -> &ServiceEndpoint<Self::Client>;
}

/// Connection-state capability shared by peers, orderers, discoverers and
/// eventers.
pub trait Connectable {
    fn name(&self) -> &str;
    fn connection_info(&self) -> ConnectionInfo;
    fn is_connected(&self) -> bool;
    fn disconnect(&self);
}

impl<T: HasEndpoint> Connectable for T {
    fn name(&self) -> &str {
        self.service_endpoint().name()
    }

    fn connection_info(&self) -> ConnectionInfo {
        self.service_endpoint().connection_info()
    }

    fn is_connected(&self) -> bool {
        self.service_endpoint().is_connected()
    }

    fn disconnect(&self) {
        self.service_endpoint().disconnect();
    }
}
