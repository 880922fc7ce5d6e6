//! Candidate host list computation.

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::HostConfig;

/// Read-only view of the realtime connection's current host.
///
/// Implemented by whatever owns the realtime connection; this crate never
/// mutates it.
pub trait ConnectionHostSource: Send + Sync {
    /// Host the live connection is attached to, if any.
    fn current_host(&self) -> Option<String>;
}

/// Ordered, duplicate-free, never-empty list of hosts for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostList {
    hosts: Vec<String>,
}

impl HostList {
    /// Build a list with `preferred` first, dropping later duplicates.
    pub fn new(preferred: impl Into<String>, rest: impl IntoIterator<Item = String>) -> Self {
        let preferred = preferred.into();
        let mut seen = HashSet::new();
        seen.insert(preferred.clone());
        let mut hosts = vec![preferred];
        for host in rest {
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
        Self { hosts }
    }

    pub fn first(&self) -> &str {
        &self.hosts[0]
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.hosts
    }
}

/// Computes the [`HostList`] for a request from configuration.
#[derive(Clone)]
pub struct HostResolver {
    primary: String,
    fallbacks: Arc<[String]>,
    connection: Option<Arc<dyn ConnectionHostSource>>,
}

impl HostResolver {
    /// Create a resolver; `max_fallbacks` caps the fallback portion.
    pub fn new(config: &HostConfig, max_fallbacks: Option<usize>) -> Self {
        let mut fallbacks = config.fallbacks();
        if let Some(max) = max_fallbacks {
            fallbacks.truncate(max);
        }
        Self {
            primary: config.primary(),
            fallbacks: fallbacks.into(),
            connection: None,
        }
    }

    /// Attach the realtime connection whose host should be preferred.
    pub fn with_connection(mut self, source: Arc<dyn ConnectionHostSource>) -> Self {
        self.connection = Some(source);
        self
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn fallbacks(&self) -> &[String] {
        &self.fallbacks
    }

    /// Host list for the next request.
    ///
    /// A live connection's host goes first, followed by every fallback;
    /// otherwise the primary host leads.
    pub fn resolve(&self) -> HostList {
        let connection_host = self
            .connection
            .as_ref()
            .and_then(|source| source.current_host())
            .filter(|host| !host.is_empty());

        let preferred = connection_host.unwrap_or_else(|| self.primary.clone());
        HostList::new(preferred, self.fallbacks.iter().cloned())
    }
}

impl std::fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostResolver")
            .field("primary", &self.primary)
            .field("fallbacks", &self.fallbacks)
            .field("has_connection", &self.connection.is_some())
            .finish()
    }
}
