//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failure should move the request to another host
//! - Bound how long a single dispatch keeps trying new hosts
//!
//! # Design Decisions
//! - Connection errors in the recognized set and 500-504 are retryable
//! - 4xx, 505+ and decode errors are terminal
//! - No backoff between hosts: the next host is a different machine

use std::time::Duration;

use http::StatusCode;
use tokio::time::Instant;

use crate::response::ResponseOutcome;

/// Whether a response status should send the request to another host.
pub fn is_retryable_status(status: StatusCode) -> bool {
    (500..=504).contains(&status.as_u16())
}

/// Whether `outcome` should be retried on another host.
pub fn should_fallback(outcome: &ResponseOutcome) -> bool {
    outcome.is_retryable_failure()
}

/// Wall-clock budget for trying further hosts within one dispatch.
#[derive(Debug, Clone, Copy)]
pub struct RetryWindow {
    started: Instant,
    max_duration: Duration,
}

impl RetryWindow {
    pub fn start(max_duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            max_duration,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the budget is spent; no further host should be tried.
    pub fn is_exhausted(&self) -> bool {
        self.elapsed() > self.max_duration
    }
}
