//! Request descriptors.
//!
//! A [`RequestDescriptor`] is what callers hand to the dispatcher; it stays
//! the same across fallback attempts. An [`HttpRequest`] is one concrete
//! request against one URI, produced per attempt.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use url::Url;

use crate::config::HostConfig;
use crate::error::TransportError;

/// Builds a full URI from the host chosen for an attempt.
pub type UriBuilder = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Where a request goes.
#[derive(Clone)]
pub enum RequestTarget {
    /// Path relative to whichever host is attempted (e.g. `/time`).
    Path(String),
    /// Absolute URI; never rewritten and never retried on fallback hosts.
    Uri(String),
    /// URI computed from the attempted host.
    Builder(UriBuilder),
}

impl RequestTarget {
    pub fn is_host_relative(&self) -> bool {
        !matches!(self, RequestTarget::Uri(_))
    }

    /// Host named by an absolute URI target; `None` for host-relative targets.
    pub fn fixed_host(&self) -> Option<String> {
        match self {
            RequestTarget::Uri(uri) => Url::parse(uri)
                .ok()
                .and_then(|url| url.host_str().map(str::to_string)),
            _ => None,
        }
    }

    /// Concrete URI for `host`.
    pub fn uri_for(&self, hosts: &HostConfig, host: &str) -> String {
        match self {
            RequestTarget::Path(path) => {
                if path.starts_with('/') {
                    format!("{}{}", hosts.base_uri(host), path)
                } else {
                    format!("{}/{}", hosts.base_uri(host), path)
                }
            }
            RequestTarget::Uri(uri) => uri.clone(),
            RequestTarget::Builder(build) => build(host),
        }
    }
}

impl fmt::Debug for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Path(path) => f.debug_tuple("Path").field(path).finish(),
            RequestTarget::Uri(uri) => f.debug_tuple("Uri").field(uri).finish(),
            RequestTarget::Builder(_) => f.write_str("Builder(..)"),
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Path(path) => f.write_str(path),
            RequestTarget::Uri(uri) => f.write_str(uri),
            RequestTarget::Builder(_) => f.write_str("<per-host uri>"),
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(path: &str) -> Self {
        if path.starts_with("http://") || path.starts_with("https://") {
            RequestTarget::Uri(path.to_string())
        } else {
            RequestTarget::Path(path.to_string())
        }
    }
}

/// Immutable description of one logical request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub target: RequestTarget,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub query: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, target: impl Into<RequestTarget>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(target: impl Into<RequestTarget>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<RequestTarget>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, target).with_body(body)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Concrete request for one attempt against `host`.
    pub fn for_host(&self, hosts: &HostConfig, host: &str) -> HttpRequest {
        HttpRequest {
            method: self.method.clone(),
            uri: self.target.uri_for(hosts, host),
            headers: self.headers.clone(),
            body: self.body.clone(),
            query: self.query.clone(),
        }
    }
}

/// One concrete request against one URI.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: None,
            query: Vec::new(),
        }
    }

    /// URI with query parameters percent-encoded onto it.
    pub fn full_uri(&self) -> Result<Uri, TransportError> {
        let mut url = Url::parse(&self.uri)
            .map_err(|e| TransportError::InvalidRequest(format!("'{}': {}", self.uri, e)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        url.as_str()
            .parse::<Uri>()
            .map_err(|e| TransportError::InvalidRequest(format!("'{}': {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts() -> HostConfig {
        HostConfig {
            primary_host: Some("main.example.com".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_path_target_follows_host() {
        let request = RequestDescriptor::get("/time");
        assert_eq!(
            request.for_host(&hosts(), "main.example.com").uri,
            "https://main.example.com/time"
        );
        assert_eq!(
            request.for_host(&hosts(), "f1.example.com").uri,
            "https://f1.example.com/time"
        );
    }

    #[test]
    fn test_absolute_target_is_fixed() {
        let request = RequestDescriptor::get("https://other.example.com/stats");
        assert!(!request.target.is_host_relative());
        assert_eq!(
            request.for_host(&hosts(), "f1.example.com").uri,
            "https://other.example.com/stats"
        );
    }

    #[test]
    fn test_fixed_host_of_absolute_target() {
        assert_eq!(
            RequestTarget::from("https://stats.example.net:8443/v1").fixed_host(),
            Some("stats.example.net".to_string())
        );
        assert_eq!(RequestTarget::from("/time").fixed_host(), None);
        assert_eq!(RequestTarget::Uri("https://".into()).fixed_host(), None);
    }

    #[test]
    fn test_builder_target() {
        let target = RequestTarget::Builder(Arc::new(|host: &str| format!("http://{}:8080/x", host)));
        let request = RequestDescriptor::new(Method::DELETE, target);
        assert_eq!(request.for_host(&hosts(), "h").uri, "http://h:8080/x");
    }

    #[test]
    fn test_query_is_encoded() {
        let request = RequestDescriptor::get("/channels/a b/messages")
            .with_query("limit", "10")
            .with_query("start", "a&b");
        let uri = request.for_host(&hosts(), "main.example.com").full_uri().unwrap();
        assert_eq!(uri.path(), "/channels/a%20b/messages");
        assert_eq!(uri.query(), Some("limit=10&start=a%26b"));
    }

    #[test]
    fn test_invalid_uri_rejected() {
        let err = HttpRequest::get("not a uri").full_uri().unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }
}
