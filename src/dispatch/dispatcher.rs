//! Host fallback state machine.
//!
//! ```text
//! CheckStoredFallback ──record──▶ UseStoredFallback ──retryable──▶ clear, restart
//!         │                              ├──window spent──▶ clear, return
//!         │                              └──otherwise──▶ return
//!         └──none──▶ ResolveHosts ──1 host──▶ single attempt, return
//!                         └──n hosts──▶ AttemptHost[0..n]
//!                                        ├─ success on host i>0 ─▶ store record
//!                                        ├─ retryable, hosts left ─▶ next host
//!                                        └─ otherwise ─▶ return
//! ```

use std::sync::Arc;

use tracing::Instrument;

use crate::config::ClientConfig;
use crate::dispatch::headers::{AuthHeaderSource, DefaultHeaders};
use crate::fallback::FallbackState;
use crate::hosts::{ConnectionHostSource, HostResolver};
use crate::observability::{metrics, tracing::new_request_id, tracing::request_span};
use crate::resilience::{should_fallback, RetryWindow};
use crate::response::ResponseOutcome;
use crate::transport::{RequestDescriptor, Transport, TransportExecutor};

/// Runs one logical request across the candidate hosts.
pub struct RequestDispatcher<T = TransportExecutor> {
    transport: T,
    resolver: HostResolver,
    fallback: Arc<FallbackState>,
    headers: DefaultHeaders,
    config: Arc<ClientConfig>,
}

impl<T: Transport> RequestDispatcher<T> {
    pub fn new(
        transport: T,
        resolver: HostResolver,
        fallback: Arc<FallbackState>,
        headers: DefaultHeaders,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            transport,
            resolver,
            fallback,
            headers,
            config,
        }
    }

    /// Prefer the live realtime connection's host.
    pub fn with_connection(mut self, source: Arc<dyn ConnectionHostSource>) -> Self {
        self.resolver = self.resolver.with_connection(source);
        self
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthHeaderSource>) -> Self {
        self.headers = self.headers.with_auth(auth);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn resolver(&self) -> &HostResolver {
        &self.resolver
    }

    pub fn fallback_state(&self) -> &Arc<FallbackState> {
        &self.fallback
    }

    /// Dispatch `request`, trying fallback hosts on retryable failures.
    pub async fn dispatch(&self, request: RequestDescriptor) -> ResponseOutcome {
        let request_id = self.config.request.add_request_ids.then(new_request_id);
        let span = request_span(&request.method, &request.target.to_string(), request_id.as_deref());
        let request = self.headers.apply(request, request_id.as_deref());

        async {
            let outcome = if request.target.is_host_relative() {
                self.dispatch_with_fallback(&request).await
            } else {
                // Absolute URIs carry their own host; nothing to fall back to.
                let host = request
                    .target
                    .fixed_host()
                    .unwrap_or_else(|| request.target.to_string());
                self.attempt(&host, &request).await
            };
            tracing::debug!(outcome = outcome.label(), "Dispatch finished");
            outcome
        }
        .instrument(span)
        .await
    }

    async fn dispatch_with_fallback(&self, request: &RequestDescriptor) -> ResponseOutcome {
        // One window for the whole dispatch, stored-host attempt included.
        let window = RetryWindow::start(self.config.fallback.max_retry_duration());
        let mut restarted = false;
        loop {
            let stored = if restarted { None } else { self.fallback.get() };
            let Some(record) = stored else {
                return self.dispatch_sequence(request, &window).await;
            };

            let outcome = self.attempt(&record.host, request).await;
            if !should_fallback(&outcome) {
                return outcome;
            }

            self.fallback.clear();
            if window.is_exhausted() {
                tracing::warn!(
                    host = %record.host,
                    elapsed_ms = window.elapsed().as_millis() as u64,
                    "Stored fallback host failed and retry window is exhausted"
                );
                return outcome;
            }
            tracing::warn!(
                host = %record.host,
                error = ?outcome.error().map(|e| &e.message),
                "Stored fallback host failed, resolving hosts again"
            );
            metrics::record_fallback_retry();
            restarted = true;
        }
    }

    async fn dispatch_sequence(
        &self,
        request: &RequestDescriptor,
        window: &RetryWindow,
    ) -> ResponseOutcome {
        let hosts = self.resolver.resolve();
        let mut outcome = self.attempt(hosts.first(), request).await;
        if hosts.len() == 1 {
            return outcome;
        }

        for host in hosts.iter().skip(1) {
            if !should_fallback(&outcome) {
                break;
            }
            if window.is_exhausted() {
                tracing::warn!(
                    elapsed_ms = window.elapsed().as_millis() as u64,
                    "Retry window exhausted, not trying further hosts"
                );
                break;
            }

            tracing::warn!(
                next_host = %host,
                error = ?outcome.error().map(|e| &e.message),
                "Retryable failure, trying next host"
            );
            metrics::record_fallback_retry();
            outcome = self.attempt(host, request).await;

            if outcome.is_success() {
                let ttl = self.config.fallback.retry_timeout();
                self.fallback.set(host, ttl);
                metrics::record_fallback_stored();
                tracing::info!(
                    host = %host,
                    ttl_ms = ttl.as_millis() as u64,
                    "Fallback host succeeded, storing as preferred host"
                );
            }
        }
        outcome
    }

    async fn attempt(&self, host: &str, request: &RequestDescriptor) -> ResponseOutcome {
        let http = request.for_host(&self.config.hosts, host);
        tracing::debug!(host = %host, uri = %http.uri, "Attempting request");
        let outcome = self.transport.execute(&http).await;
        tracing::debug!(
            host = %host,
            outcome = outcome.label(),
            status = ?outcome.status().map(|s| s.as_u16()),
            "Attempt finished"
        );
        outcome
    }
}

impl<T> std::fmt::Debug for RequestDispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("resolver", &self.resolver)
            .field("fallback", &self.fallback)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, HeaderValue, StatusCode};

    use crate::config::HostConfig;
    use crate::error::{NetworkErrorKind, TransportError};
    use crate::response::{classify_response, classify_transport_error};
    use crate::transport::HttpRequest;

    #[derive(Clone, Copy)]
    enum Reply {
        Ok,
        Status(u16),
        Timeout,
        Refused,
        Unreachable,
    }

    /// Scripted transport: per-host replies, records every URI attempted.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<HashMap<String, Reply>>,
        calls: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedTransport {
        fn with(replies: &[(&str, Reply)]) -> Self {
            let transport = Self::default();
            transport.script(replies);
            transport
        }

        fn script(&self, replies: &[(&str, Reply)]) {
            let mut map = self.replies.lock().unwrap();
            for (host, reply) in replies {
                map.insert(host.to_string(), *reply);
            }
        }

        fn hosts_called(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|uri| url::Url::parse(uri).unwrap().host_str().unwrap().to_string())
                .collect()
        }

        fn reset_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    impl Transport for ScriptedTransport {
        async fn execute(&self, request: &HttpRequest) -> ResponseOutcome {
            self.calls.lock().unwrap().push(request.full_uri().unwrap().to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let host = url::Url::parse(&request.uri)
                .unwrap()
                .host_str()
                .unwrap()
                .to_string();
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get(&host)
                .copied()
                .unwrap_or(Reply::Ok);

            match reply {
                Reply::Ok => {
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    classify_response(StatusCode::OK, headers, Bytes::from_static(br#"{"ok":true}"#))
                }
                Reply::Status(code) => classify_response(
                    StatusCode::from_u16(code).unwrap(),
                    HeaderMap::new(),
                    Bytes::new(),
                ),
                Reply::Timeout => classify_transport_error(&TransportError::Timeout {
                    uri: request.uri.clone(),
                    timeout: Duration::from_secs(10),
                }),
                Reply::Refused => classify_transport_error(&TransportError::Network {
                    kind: NetworkErrorKind::ConnectionRefused,
                    uri: request.uri.clone(),
                    detail: "connection refused".into(),
                }),
                Reply::Unreachable => classify_transport_error(&TransportError::Network {
                    kind: NetworkErrorKind::HostUnreachable,
                    uri: request.uri.clone(),
                    detail: "no route to host".into(),
                }),
            }
        }
    }

    const TTL: Duration = Duration::from_secs(600);

    fn config(fallbacks: &[&str]) -> ClientConfig {
        let mut config = ClientConfig {
            hosts: HostConfig {
                primary_host: Some("main.example.com".into()),
                fallback_hosts: Some(fallbacks.iter().map(|h| h.to_string()).collect()),
                ..Default::default()
            },
            ..Default::default()
        };
        config.fallback.retry_timeout_ms = TTL.as_millis() as u64;
        config
    }

    fn dispatcher<T: Transport>(transport: T, config: ClientConfig) -> RequestDispatcher<T> {
        let resolver = HostResolver::new(&config.hosts, config.fallback.max_retry_count);
        let headers = DefaultHeaders::new(&config.request);
        RequestDispatcher::new(
            transport,
            resolver,
            Arc::new(FallbackState::new()),
            headers,
            Arc::new(config),
        )
    }

    fn transport(d: &RequestDispatcher<Arc<ScriptedTransport>>) -> &ScriptedTransport {
        &d.transport
    }

    #[tokio::test]
    async fn test_single_host_single_attempt() {
        let scripted = Arc::new(ScriptedTransport::with(&[("main.example.com", Reply::Status(503))]));
        let d = dispatcher(scripted, config(&[]));

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(transport(&d).hosts_called(), vec!["main.example.com"]);
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_third_host_stores_record() {
        let scripted = Arc::new(ScriptedTransport::with(&[
            ("main.example.com", Reply::Refused),
            ("f1.example.com", Reply::Status(502)),
        ]));
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com", "f3.example.com"]));

        let started = tokio::time::Instant::now();
        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_success());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["main.example.com", "f1.example.com", "f2.example.com"]
        );

        let record = d.fallback_state().get().unwrap();
        assert_eq!(record.host, "f2.example.com");
        assert_eq!(record.valid_until, started + TTL);
    }

    #[tokio::test]
    async fn test_first_host_success_stores_nothing() {
        let scripted = Arc::new(ScriptedTransport::default());
        let d = dispatcher(scripted, config(&["f1.example.com"]));

        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        assert_eq!(transport(&d).hosts_called(), vec!["main.example.com"]);
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test]
    async fn test_timeout_then_success_scenario() {
        let scripted = Arc::new(ScriptedTransport::with(&[("a.example.com", Reply::Timeout)]));
        let mut config = config(&["b.example.com"]);
        config.hosts.primary_host = Some("a.example.com".into());
        let d = dispatcher(scripted, config);

        let response = d.dispatch(RequestDescriptor::get("/time")).await.into_rest_response();
        assert!(response.error.is_none());
        assert!(!response.is_error);
        assert_eq!(response.status_code, Some(200));
        assert_eq!(response.body.unwrap().to_json(), serde_json::json!({"ok": true}));
        assert_eq!(d.fallback_state().get().unwrap().host, "b.example.com");
    }

    #[tokio::test]
    async fn test_stored_record_is_tried_alone_first() {
        let scripted = Arc::new(ScriptedTransport::default());
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));
        d.fallback_state().set("f2.example.com", TTL);

        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        assert_eq!(transport(&d).hosts_called(), vec!["f2.example.com"]);
        assert_eq!(d.fallback_state().get().unwrap().host, "f2.example.com");
    }

    #[tokio::test]
    async fn test_failed_stored_record_restarts_full_sequence() {
        let scripted = Arc::new(ScriptedTransport::with(&[("f2.example.com", Reply::Refused)]));
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));
        d.fallback_state().set("f2.example.com", TTL);

        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["f2.example.com", "main.example.com"]
        );
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test]
    async fn test_restart_happens_only_once() {
        let scripted = Arc::new(ScriptedTransport::with(&[
            ("main.example.com", Reply::Status(500)),
            ("f1.example.com", Reply::Status(500)),
        ]));
        let d = dispatcher(scripted, config(&["f1.example.com"]));
        d.fallback_state().set("f1.example.com", TTL);

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        // Stored host, then the fresh sequence, which still includes it.
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["f1.example.com", "main.example.com", "f1.example.com"]
        );
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test]
    async fn test_non_retryable_stored_failure_keeps_record() {
        let scripted = Arc::new(ScriptedTransport::with(&[("f1.example.com", Reply::Status(404))]));
        let d = dispatcher(scripted, config(&["f1.example.com"]));
        d.fallback_state().set("f1.example.com", TTL);

        let outcome = d.dispatch(RequestDescriptor::get("/missing")).await;
        assert_eq!(outcome.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(transport(&d).hosts_called(), vec!["f1.example.com"]);
        assert!(d.fallback_state().get().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_record_is_ignored() {
        let scripted = Arc::new(ScriptedTransport::default());
        let d = dispatcher(scripted, config(&["f1.example.com"]));
        d.fallback_state().set("f1.example.com", TTL);

        tokio::time::advance(TTL).await;
        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        assert_eq!(transport(&d).hosts_called(), vec!["main.example.com"]);
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        for status in [401u16, 404] {
            let scripted = Arc::new(ScriptedTransport::with(&[("main.example.com", Reply::Status(status))]));
            let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));

            let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
            assert_eq!(outcome.status().map(|s| s.as_u16()), Some(status));
            assert_eq!(transport(&d).hosts_called(), vec!["main.example.com"]);
            assert!(d.fallback_state().peek().is_none());
        }
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let scripted = Arc::new(ScriptedTransport::with(&[
            ("main.example.com", Reply::Refused),
            ("f1.example.com", Reply::Status(503)),
        ]));
        let d = dispatcher(scripted, config(&["f1.example.com"]));

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(outcome.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_window_stops_sequence() {
        let scripted = Arc::new(ScriptedTransport {
            delay: Duration::from_secs(10),
            ..Default::default()
        });
        scripted.script(&[
            ("main.example.com", Reply::Timeout),
            ("f1.example.com", Reply::Timeout),
        ]);
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["main.example.com", "f1.example.com"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_window_counts_first_attempt() {
        let scripted = Arc::new(ScriptedTransport {
            delay: Duration::from_secs(20),
            ..Default::default()
        });
        scripted.script(&[
            ("main.example.com", Reply::Timeout),
            ("f1.example.com", Reply::Timeout),
        ]);
        let d = dispatcher(scripted, config(&["f1.example.com"]));

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(transport(&d).hosts_called(), vec!["main.example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_stored_host_spends_retry_window() {
        let scripted = Arc::new(ScriptedTransport {
            delay: Duration::from_secs(20),
            ..Default::default()
        });
        scripted.script(&[("f1.example.com", Reply::Timeout)]);
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));
        d.fallback_state().set("f1.example.com", TTL);

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(transport(&d).hosts_called(), vec!["f1.example.com"]);
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_spans_restart() {
        let scripted = Arc::new(ScriptedTransport {
            delay: Duration::from_secs(10),
            ..Default::default()
        });
        scripted.script(&[
            ("f1.example.com", Reply::Timeout),
            ("main.example.com", Reply::Timeout),
        ]);
        let d = dispatcher(scripted, config(&["f1.example.com", "f2.example.com"]));
        d.fallback_state().set("f1.example.com", TTL);

        // 10s on the stored host, 10s on the primary: f1 and f2 are never reached.
        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["f1.example.com", "main.example.com"]
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_falls_back() {
        let scripted = Arc::new(ScriptedTransport::with(&[("main.example.com", Reply::Unreachable)]));
        let d = dispatcher(scripted, config(&["f1.example.com"]));

        let outcome = d.dispatch(RequestDescriptor::get("/time")).await;
        assert!(outcome.is_success());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["main.example.com", "f1.example.com"]
        );
        assert_eq!(d.fallback_state().get().unwrap().host, "f1.example.com");
    }

    #[tokio::test]
    async fn test_max_retry_count_caps_fallbacks() {
        let scripted = Arc::new(ScriptedTransport::with(&[
            ("main.example.com", Reply::Refused),
            ("f1.example.com", Reply::Refused),
        ]));
        let mut config = config(&["f1.example.com", "f2.example.com"]);
        config.fallback.max_retry_count = Some(1);
        let d = dispatcher(scripted, config);

        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_retryable_failure());
        assert_eq!(
            transport(&d).hosts_called(),
            vec!["main.example.com", "f1.example.com"]
        );
    }

    #[tokio::test]
    async fn test_absolute_uri_single_attempt() {
        let scripted = Arc::new(ScriptedTransport::with(&[("stats.example.net", Reply::Status(503))]));
        let d = dispatcher(scripted, config(&["f1.example.com"]));

        let outcome = d
            .dispatch(RequestDescriptor::get("https://stats.example.net/v1"))
            .await;
        assert!(outcome.is_retryable_failure());
        assert_eq!(transport(&d).hosts_called(), vec!["stats.example.net"]);
        assert!(d.fallback_state().peek().is_none());
    }

    #[tokio::test]
    async fn test_request_id_is_shared_across_hosts() {
        let scripted = Arc::new(ScriptedTransport::with(&[("main.example.com", Reply::Refused)]));
        let mut config = config(&["f1.example.com"]);
        config.request.add_request_ids = true;
        let d = dispatcher(scripted, config);

        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        let calls = transport(&d).calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        let id_of = |uri: &str| {
            url::Url::parse(uri)
                .unwrap()
                .query_pairs()
                .find(|(k, _)| k == "request_id")
                .map(|(_, v)| v.into_owned())
                .unwrap()
        };
        assert_eq!(id_of(&calls[0]), id_of(&calls[1]));

        transport(&d).reset_calls();
        assert!(d.dispatch(RequestDescriptor::get("/time")).await.is_success());
        let next = transport(&d).calls.lock().unwrap()[0].clone();
        assert_ne!(id_of(&next), id_of(&calls[0]));
    }
}
