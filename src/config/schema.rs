//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default REST host when no environment is configured.
pub const DEFAULT_PRIMARY_HOST: &str = "rest.ably.io";

/// Letters of the default fallback hosts, in preference order.
const FALLBACK_LETTERS: [char; 5] = ['a', 'b', 'c', 'd', 'e'];

/// Externally documented "is the internet up" endpoint.
pub const DEFAULT_CONNECTIVITY_CHECK_URL: &str =
    "https://internet-up.ably-realtime.com/is-the-internet-up.txt";

/// Protocol version sent with every request.
pub const PROTOCOL_VERSION: &str = "2";

/// Root configuration for the REST client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Primary and fallback hosts.
    pub hosts: HostConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Fallback retry behaviour.
    pub fallback: FallbackConfig,

    /// Connection pool options.
    pub agent: AgentConfig,

    /// Connectivity probe settings.
    pub connectivity: ConnectivityConfig,

    /// Per-request defaults.
    pub request: RequestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Host configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Explicit primary host. Derived from `environment` when unset.
    pub primary_host: Option<String>,

    /// Explicit fallback hosts. Derived from `environment` when unset.
    pub fallback_hosts: Option<Vec<String>>,

    /// Environment prefix (e.g. "sandbox").
    pub environment: Option<String>,

    /// Use HTTPS.
    pub tls: bool,

    /// Plaintext port.
    pub port: u16,

    /// TLS port.
    pub tls_port: u16,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            primary_host: None,
            fallback_hosts: None,
            environment: None,
            tls: true,
            port: 80,
            tls_port: 443,
        }
    }
}

impl HostConfig {
    fn environment(&self) -> Option<&str> {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|env| !env.is_empty() && *env != "production")
    }

    /// Effective primary host.
    pub fn primary(&self) -> String {
        if let Some(host) = &self.primary_host {
            return host.clone();
        }
        match self.environment() {
            Some(env) => format!("{}-{}", env, DEFAULT_PRIMARY_HOST),
            None => DEFAULT_PRIMARY_HOST.to_string(),
        }
    }

    /// Effective fallback hosts, in preference order.
    ///
    /// An explicit primary host without explicit fallbacks disables fallback.
    pub fn fallbacks(&self) -> Vec<String> {
        if let Some(hosts) = &self.fallback_hosts {
            return hosts.clone();
        }
        if self.primary_host.is_some() {
            return Vec::new();
        }
        let env = self.environment();
        FALLBACK_LETTERS
            .iter()
            .map(|letter| match env {
                Some(env) => format!("{}-{}-fallback.ably-realtime.com", env, letter),
                None => format!("{}.ably-realtime.com", letter),
            })
            .collect()
    }

    pub fn scheme(&self) -> &'static str {
        if self.tls {
            "https"
        } else {
            "http"
        }
    }

    pub fn effective_port(&self) -> u16 {
        if self.tls {
            self.tls_port
        } else {
            self.port
        }
    }

    /// Base URI for a host, omitting the scheme's default port.
    pub fn base_uri(&self, host: &str) -> String {
        let port = self.effective_port();
        let default_port = if self.tls { 443 } else { 80 };
        if port == default_port {
            format!("{}://{}", self.scheme(), host)
        } else {
            format!("{}://{}:{}", self.scheme(), host, port)
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for one request/response round trip in milliseconds.
    pub request_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 10_000,
            connect_ms: 4_000,
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

/// Fallback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// How long a successful fallback host is preferred, in milliseconds.
    pub retry_timeout_ms: u64,

    /// Maximum number of fallback hosts considered per request (unlimited if unset).
    pub max_retry_count: Option<usize>,

    /// No further host is attempted once a request has run this long, in milliseconds.
    pub max_retry_duration_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            retry_timeout_ms: 600_000,
            max_retry_count: None,
            max_retry_duration_ms: 15_000,
        }
    }
}

impl FallbackConfig {
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }

    pub fn max_retry_duration(&self) -> Duration {
        Duration::from_millis(self.max_retry_duration_ms)
    }
}

/// Connection pool options shared by both agents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Idle pooled connections are closed after this many seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,

    /// Enable HTTP/2 negotiation over TLS.
    pub http2: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 8,
            http2: true,
        }
    }
}

/// Connectivity probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// URL expected to answer `yes`.
    pub check_url: String,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            check_url: DEFAULT_CONNECTIVITY_CHECK_URL.to_string(),
        }
    }
}

/// Per-request defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RequestConfig {
    /// Ask for MessagePack instead of JSON.
    pub use_binary_protocol: bool,

    /// Append a `request_id` query parameter, stable across fallback attempts.
    pub add_request_ids: bool,

    /// API key used for Basic auth when no auth source is attached.
    pub api_key: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
