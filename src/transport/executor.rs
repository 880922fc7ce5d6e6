//! Single-attempt request execution.
//!
//! # Responsibilities
//! - Send one request to one URI through the shared agent pool
//! - Read the full body under the request deadline
//! - Classify the result; never return an error out of band
//!
//! # Design Decisions
//! - `Transport` is the seam the dispatcher and prober depend on, so tests
//!   can script outcomes per host
//! - The deadline covers the send and the body read together

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use tokio::time::Instant;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::observability::metrics;
use crate::resilience::with_request_timeout;
use crate::response::{classify_response, classify_transport_error, ResponseOutcome};
use crate::transport::agent::AgentPool;
use crate::transport::request::HttpRequest;

/// Performs one HTTP round trip and classifies it.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> impl Future<Output = ResponseOutcome> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> impl Future<Output = ResponseOutcome> + Send {
        (**self).execute(request)
    }
}

/// [`Transport`] backed by the pooled hyper agents.
#[derive(Debug, Clone)]
pub struct TransportExecutor {
    agents: Arc<AgentPool>,
    request_timeout: Duration,
}

impl TransportExecutor {
    pub fn new(agents: Arc<AgentPool>, request_timeout: Duration) -> Self {
        Self {
            agents,
            request_timeout,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(AgentPool::from_config(config), config.timeouts.request())
    }

    pub fn agents(&self) -> &Arc<AgentPool> {
        &self.agents
    }

    /// Send `request`, returning status, headers and the collected body.
    pub async fn send(
        &self,
        request: &HttpRequest,
    ) -> Result<(http::StatusCode, http::HeaderMap, Bytes), TransportError> {
        let uri = request.full_uri()?;
        let uri_text = uri.to_string();

        let mut builder = Request::builder().method(request.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(request.headers.clone());
        }
        let hyper_request = builder
            .body(Full::new(request.body.clone().unwrap_or_default()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        with_request_timeout(self.request_timeout, &uri_text, async {
            let response = self.agents.request(hyper_request).await?;
            let (parts, body) = response.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|e| TransportError::network(&uri_text, &e))?
                .to_bytes();
            Ok::<_, TransportError>((parts.status, parts.headers, bytes))
        })
        .await
    }
}

impl Transport for TransportExecutor {
    async fn execute(&self, request: &HttpRequest) -> ResponseOutcome {
        let started = Instant::now();
        let outcome = match self.send(request).await {
            Ok((status, headers, body)) => classify_response(status, headers, body),
            Err(err) => {
                tracing::debug!(uri = %request.uri, error = %err, "Request failed in transport");
                classify_transport_error(&err)
            }
        };

        let host = host_label(&request.uri);
        metrics::record_request(&host, outcome.label(), started.elapsed());
        outcome
    }
}

fn host_label(uri: &str) -> String {
    url::Url::parse(uri)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}
