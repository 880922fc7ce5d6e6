//! Error types shared by every layer of the transport.
//!
//! Request failures are values, not panics: whatever goes wrong during a
//! request ends up as an [`ErrorInfo`] inside a
//! [`ResponseOutcome::Failure`](crate::response::ResponseOutcome).
//! [`TransportError`] is the executor-internal form of "no response was
//! obtained", classified into a [`NetworkErrorKind`].

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Error code carried by an [`ErrorInfo`].
///
/// Server payloads use numeric codes (e.g. `40100`); transport failures use
/// the symbolic network code (e.g. `"ECONNREFUSED"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::Text(code.to_string())
    }
}

/// Uniform error shape handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<ErrorCode>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>, code: Option<ErrorCode>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            code,
            status_code,
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match (&self.code, self.status_code) {
            (Some(code), Some(status)) => write!(f, " (code: {}, status: {})", code, status),
            (Some(code), None) => write!(f, " (code: {})", code),
            (None, Some(status)) => write!(f, " (status: {})", status),
            (None, None) => Ok(()),
        }
    }
}

impl StdError for ErrorInfo {}

#[cfg(target_os = "linux")]
const EHOSTDOWN: i32 = 112;
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
const EHOSTDOWN: i32 = 64;
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios", target_os = "freebsd")))]
const EHOSTDOWN: i32 = -1;

/// Classified network-layer failure (no HTTP response was obtained).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkErrorKind {
    HostUnreachable,
    NetworkUnreachable,
    HostDown,
    TimedOut,
    DnsFailure,
    ConnectionReset,
    ConnectionRefused,
    /// Anything not in the recognized set. Never retried.
    Other,
}

impl NetworkErrorKind {
    /// Symbolic code surfaced in [`ErrorInfo::code`].
    pub fn code(self) -> &'static str {
        match self {
            NetworkErrorKind::HostUnreachable => "EHOSTUNREACH",
            NetworkErrorKind::NetworkUnreachable => "ENETUNREACH",
            NetworkErrorKind::HostDown => "EHOSTDOWN",
            NetworkErrorKind::TimedOut => "ETIMEDOUT",
            NetworkErrorKind::DnsFailure => "EAI_AGAIN",
            NetworkErrorKind::ConnectionReset => "ECONNRESET",
            NetworkErrorKind::ConnectionRefused => "ECONNREFUSED",
            NetworkErrorKind::Other => "ENETWORK",
        }
    }

    pub fn is_retryable(self) -> bool {
        !matches!(self, NetworkErrorKind::Other)
    }

    /// Classify a single I/O error.
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => return NetworkErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset => return NetworkErrorKind::ConnectionReset,
            io::ErrorKind::TimedOut => return NetworkErrorKind::TimedOut,
            io::ErrorKind::HostUnreachable => return NetworkErrorKind::HostUnreachable,
            io::ErrorKind::NetworkUnreachable => return NetworkErrorKind::NetworkUnreachable,
            _ => {}
        }
        if err.raw_os_error() == Some(EHOSTDOWN) {
            return NetworkErrorKind::HostDown;
        }
        if is_dns_message(&err.to_string()) {
            return NetworkErrorKind::DnsFailure;
        }
        NetworkErrorKind::Other
    }

    /// Walk an error's source chain looking for a recognized cause.
    pub fn from_error_chain(err: &(dyn StdError + 'static)) -> Self {
        let mut current: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = current {
            if let Some(io_err) = e.downcast_ref::<io::Error>() {
                let kind = Self::from_io(io_err);
                if kind != NetworkErrorKind::Other {
                    return kind;
                }
            } else if is_dns_message(&e.to_string()) {
                return NetworkErrorKind::DnsFailure;
            }
            current = e.source();
        }
        NetworkErrorKind::Other
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

fn is_dns_message(message: &str) -> bool {
    message.starts_with("dns error") || message.contains("failed to lookup address")
}

/// Failure to obtain any response from a host.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection-level failure, classified.
    #[error("{kind} contacting {uri}: {detail}")]
    Network {
        kind: NetworkErrorKind,
        uri: String,
        detail: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request to {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },

    /// The request could not be built (bad URI, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// TLS agent could not be initialised.
    #[error("TLS setup failed: {0}")]
    Tls(String),
}

impl TransportError {
    /// Classify a connection error raised by the HTTP agent.
    pub fn network(uri: &str, err: &(dyn StdError + 'static)) -> Self {
        TransportError::Network {
            kind: NetworkErrorKind::from_error_chain(err),
            uri: uri.to_string(),
            detail: render_chain(err),
        }
    }

    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            TransportError::Network { kind, .. } => *kind,
            TransportError::Timeout { .. } => NetworkErrorKind::TimedOut,
            TransportError::InvalidRequest(_) | TransportError::Tls(_) => NetworkErrorKind::Other,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let code = match self {
            TransportError::InvalidRequest(_) => ErrorCode::Number(40000),
            _ => ErrorCode::Text(self.kind().code().to_string()),
        };
        ErrorInfo::new(self.to_string(), Some(code), None)
    }
}

fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        out.push_str(": ");
        out.push_str(&e.to_string());
        current = e.source();
    }
    out
}

/// Errors raised while constructing a client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
