//! REST client entry point.
//!
//! Wires configuration, host resolution, fallback memory, the shared agent
//! pool and the connectivity prober into one handle.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method};

use crate::config::{validate_config, ClientConfig, ConfigError};
use crate::dispatch::{AuthHeaderSource, DefaultHeaders, RequestDispatcher};
use crate::error::ClientError;
use crate::fallback::FallbackState;
use crate::health::ConnectivityProber;
use crate::hosts::{ConnectionHostSource, HostResolver};
use crate::response::{ResponseOutcome, RestResponse};
use crate::transport::{AgentPool, RequestDescriptor, RequestTarget, Transport, TransportExecutor};

/// REST client with host fallback.
///
/// Cheap to share behind an `Arc`; concurrent requests share the fallback
/// record and the connection pools.
#[derive(Debug)]
pub struct RestClient<T = TransportExecutor> {
    config: Arc<ClientConfig>,
    dispatcher: RequestDispatcher<Arc<T>>,
    prober: ConnectivityProber<Arc<T>>,
}

impl RestClient<TransportExecutor> {
    /// Validate `config` and build a client with its own agent pool.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let agents = AgentPool::from_config(&config);
        Self::with_agents(config, agents)
    }

    /// Build a client that shares an existing agent pool.
    pub fn with_agents(config: ClientConfig, agents: Arc<AgentPool>) -> Result<Self, ClientError> {
        let transport = TransportExecutor::new(agents, config.timeouts.request());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> RestClient<T> {
    /// Build a client over a custom [`Transport`].
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        validate_config(&config).map_err(|errors| ClientError::Config(ConfigError::Validation(errors)))?;

        let config = Arc::new(config);
        let transport = Arc::new(transport);
        let resolver = HostResolver::new(&config.hosts, config.fallback.max_retry_count);
        let dispatcher = RequestDispatcher::new(
            transport.clone(),
            resolver,
            Arc::new(FallbackState::new()),
            DefaultHeaders::new(&config.request),
            config.clone(),
        );
        let prober = ConnectivityProber::new(transport, &config.connectivity);

        tracing::debug!(
            primary = %dispatcher.resolver().primary(),
            fallbacks = dispatcher.resolver().fallbacks().len(),
            "REST client created"
        );

        Ok(Self {
            config,
            dispatcher,
            prober,
        })
    }

    /// Prefer the host of a live realtime connection.
    pub fn with_connection(mut self, source: Arc<dyn ConnectionHostSource>) -> Self {
        self.dispatcher = self.dispatcher.with_connection(source);
        self
    }

    /// Supply `Authorization` headers from `auth` instead of the API key.
    pub fn with_auth(mut self, auth: Arc<dyn AuthHeaderSource>) -> Self {
        self.dispatcher = self.dispatcher.with_auth(auth);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn fallback_state(&self) -> &Arc<FallbackState> {
        self.dispatcher.fallback_state()
    }

    /// Run `request` with host fallback and return the classified outcome.
    pub async fn dispatch(&self, request: RequestDescriptor) -> ResponseOutcome {
        self.dispatcher.dispatch(request).await
    }

    /// Issue a request and flatten the outcome into a [`RestResponse`].
    pub async fn request(
        &self,
        method: Method,
        target: impl Into<RequestTarget>,
        headers: HeaderMap,
        body: Option<Bytes>,
        query: Option<Vec<(String, String)>>,
    ) -> RestResponse {
        let mut request = RequestDescriptor::new(method, target).with_headers(headers);
        request.body = body;
        request.query = query.unwrap_or_default();
        self.dispatch(request).await.into_rest_response()
    }

    /// Whether the internet is reachable; never fails.
    pub async fn check_connectivity(&self) -> bool {
        self.prober.check().await
    }
}
