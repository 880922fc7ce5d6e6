//! Connection-pooling HTTP agents.
//!
//! # Responsibilities
//! - Hold one pooled agent for plaintext and one for TLS
//! - Build each agent on first use and keep it for the pool's lifetime
//! - Route a request to the agent matching its URI scheme
//!
//! # Design Decisions
//! - Requests repeatedly target the same one or two hosts, so pooled
//!   keep-alive connections are reused across every request and client
//!   sharing the same `Arc<AgentPool>`
//! - The pool is an explicit value injected into executors, not a static

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::OnceCell;

use crate::config::{AgentConfig, ClientConfig};
use crate::error::TransportError;

type PlainAgent = Client<HttpConnector, Full<Bytes>>;
type TlsAgent = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Lazily built pair of pooled HTTP agents.
pub struct AgentPool {
    config: AgentConfig,
    connect_timeout: Duration,
    plain: OnceCell<PlainAgent>,
    tls: OnceCell<TlsAgent>,
}

impl AgentPool {
    pub fn new(config: AgentConfig, connect_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
            plain: OnceCell::new(),
            tls: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Arc<Self> {
        Arc::new(Self::new(config.agent.clone(), config.timeouts.connect()))
    }

    /// Send `request` through the agent for its scheme.
    pub async fn request(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, TransportError> {
        let uri = request.uri().to_string();
        let result = match request.uri().scheme_str() {
            Some("https") => self.tls_agent().await?.request(request).await,
            Some("http") => self.plain_agent().await.request(request).await,
            other => {
                return Err(TransportError::InvalidRequest(format!(
                    "unsupported scheme {:?} in '{}'",
                    other, uri
                )))
            }
        };
        result.map_err(|e| TransportError::network(&uri, &e))
    }

    /// Whether each agent has been built yet, as `(plain, tls)`.
    pub fn initialized(&self) -> (bool, bool) {
        (self.plain.initialized(), self.tls.initialized())
    }

    async fn plain_agent(&self) -> &PlainAgent {
        self.plain
            .get_or_init(|| async {
                tracing::debug!("Initializing plaintext HTTP agent");
                let mut http = HttpConnector::new();
                http.set_connect_timeout(Some(self.connect_timeout));
                http.set_nodelay(true);
                self.client_builder().build(http)
            })
            .await
    }

    async fn tls_agent(&self) -> Result<&TlsAgent, TransportError> {
        self.tls
            .get_or_try_init(|| async {
                tracing::debug!(http2 = self.config.http2, "Initializing TLS HTTP agent");
                let mut http = HttpConnector::new();
                http.set_connect_timeout(Some(self.connect_timeout));
                http.set_nodelay(true);
                http.enforce_http(false);

                let builder = HttpsConnectorBuilder::new()
                    .with_tls_config(tls_config()?)
                    .https_only()
                    .enable_http1();
                let https = if self.config.http2 {
                    builder.enable_http2().wrap_connector(http)
                } else {
                    builder.wrap_connector(http)
                };
                Ok::<_, TransportError>(self.client_builder().build(https))
            })
            .await
    }

    fn client_builder(&self) -> hyper_util::client::legacy::Builder {
        let mut builder = Client::builder(TokioExecutor::new());
        builder
            .pool_idle_timeout(Duration::from_secs(self.config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host);
        builder
    }
}

fn tls_config() -> Result<rustls::ClientConfig, TransportError> {
    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| TransportError::Tls(e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

impl std::fmt::Debug for AgentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (plain, tls) = self.initialized();
        f.debug_struct("AgentPool")
            .field("config", &self.config)
            .field("connect_timeout", &self.connect_timeout)
            .field("plain_initialized", &plain)
            .field("tls_initialized", &tls)
            .finish()
    }
}
