//! Remembered fallback host.
//!
//! # States
//! ```text
//! Empty ──set(host, ttl)──▶ Stored{host, valid_until}
//! Stored ──now >= valid_until──▶ Empty   (on next read)
//! Stored ──clear()──▶ Empty              (retryable failure through it)
//! Stored ──set(other, ttl)──▶ Stored     (overwrite, never append)
//! ```
//!
//! # Design Decisions
//! - One record per client, owned by the client instance
//! - Lock-free swaps; concurrent dispatches may race, which only costs an
//!   extra probe or one stale reuse that corrects itself
//! - Uses tokio's clock so expiry can be tested with paused time

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::time::Instant;

/// A recently successful fallback host and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackRecord {
    pub host: String,
    pub valid_until: Instant,
}

impl FallbackRecord {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.valid_until
    }
}

/// Holder for at most one [`FallbackRecord`].
#[derive(Debug, Default)]
pub struct FallbackState {
    record: ArcSwapOption<FallbackRecord>,
}

impl FallbackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record, if present and not expired.
    ///
    /// An expired record is dropped as a side effect.
    pub fn get(&self) -> Option<Arc<FallbackRecord>> {
        let record = self.record.load_full()?;
        if record.is_expired() {
            tracing::debug!(host = %record.host, "Stored fallback host expired");
            // Only drop the record we observed; a concurrent set wins.
            let observed = Some(record);
            let _ = self.record.compare_and_swap(&observed, None::<Arc<FallbackRecord>>);
            return None;
        }
        Some(record)
    }

    /// Remember `host` for `ttl`, replacing any existing record.
    pub fn set(&self, host: &str, ttl: Duration) -> Arc<FallbackRecord> {
        let record = Arc::new(FallbackRecord {
            host: host.to_string(),
            valid_until: Instant::now() + ttl,
        });
        self.record.store(Some(record.clone()));
        record
    }

    pub fn clear(&self) {
        self.record.store(None);
    }

    /// Raw record, expired or not.
    pub fn peek(&self) -> Option<Arc<FallbackRecord>> {
        self.record.load_full()
    }
}
