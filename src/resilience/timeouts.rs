//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap one round trip (send + body read) with the request deadline
//! - Report expiry as a retryable `ETIMEDOUT` transport error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The connect phase has its own, shorter timeout on the connector

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::TransportError;

/// Run `fut`, failing with [`TransportError::Timeout`] after `limit`.
pub async fn with_request_timeout<F, T>(limit: Duration, uri: &str, fut: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout {
            uri: uri.to_string(),
            timeout: limit,
        }),
    }
}
