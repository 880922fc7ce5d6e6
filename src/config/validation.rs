//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first.

use std::collections::HashSet;
use std::fmt;

use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a [`ClientConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let primary = config.hosts.primary();
    if !is_valid_host(&primary) {
        errors.push(ValidationError::new(
            "hosts.primary_host",
            format!("'{}' is not a valid host name", primary),
        ));
    }

    let mut seen = HashSet::new();
    for host in config.hosts.fallbacks() {
        if !is_valid_host(&host) {
            errors.push(ValidationError::new(
                "hosts.fallback_hosts",
                format!("'{}' is not a valid host name", host),
            ));
        }
        if !seen.insert(host.clone()) {
            errors.push(ValidationError::new(
                "hosts.fallback_hosts",
                format!("'{}' is listed more than once", host),
            ));
        }
    }

    if config.hosts.effective_port() == 0 {
        errors.push(ValidationError::new("hosts.port", "port must be non-zero"));
    }

    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::new("timeouts.request_ms", "must be greater than zero"));
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::new("timeouts.connect_ms", "must be greater than zero"));
    }

    if config.fallback.retry_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "fallback.retry_timeout_ms",
            "must be greater than zero",
        ));
    }

    if Url::parse(&config.connectivity.check_url).is_err() {
        errors.push(ValidationError::new(
            "connectivity.check_url",
            format!("'{}' is not a valid URL", config.connectivity.check_url),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && !host.contains(|c: char| c.is_whitespace() || c == '/' || c == '?' || c == '#')
}
