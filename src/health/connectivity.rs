//! Internet connectivity probing.
//!
//! # Responsibilities
//! - Issue one GET against the up-check URL
//! - Report `true` only for a successful response whose body reads `yes`
//!
//! # Design Decisions
//! - Bypasses host resolution and fallback; the URL is absolute
//! - Failures are logged and folded into `false`, never returned
//! - Only a passed-through text body is compared, so a decoded JSON `"yes"`
//!   does not count

use crate::config::ConnectivityConfig;
use crate::observability::metrics;
use crate::response::{ResponseBody, ResponseOutcome};
use crate::transport::{HttpRequest, Transport, TransportExecutor};

/// Expected up-check body, after trimming whitespace.
const UP_BODY: &str = "yes";

/// Checks general internet reachability.
#[derive(Debug)]
pub struct ConnectivityProber<T = TransportExecutor> {
    transport: T,
    check_url: String,
}

impl<T: Transport> ConnectivityProber<T> {
    pub fn new(transport: T, config: &ConnectivityConfig) -> Self {
        Self {
            transport,
            check_url: config.check_url.clone(),
        }
    }

    pub fn check_url(&self) -> &str {
        &self.check_url
    }

    pub async fn check(&self) -> bool {
        let outcome = self.transport.execute(&HttpRequest::get(&self.check_url)).await;
        let up = match &outcome {
            ResponseOutcome::Success(success) => {
                let text = success.body.as_ref().and_then(ResponseBody::as_text);
                let up = text.as_deref().map(str::trim) == Some(UP_BODY);
                if !up {
                    let body = success
                        .body
                        .as_ref()
                        .map(ResponseBody::render_safe)
                        .unwrap_or_default();
                    tracing::warn!(
                        url = %self.check_url,
                        body = %body,
                        "Connectivity check returned unexpected body"
                    );
                }
                up
            }
            ResponseOutcome::Failure(failure) => {
                tracing::warn!(
                    url = %self.check_url,
                    error = %failure.error,
                    "Connectivity check failed"
                );
                false
            }
        };

        tracing::debug!(url = %self.check_url, up, "Connectivity check finished");
        metrics::record_connectivity_check(up);
        up
    }
}
