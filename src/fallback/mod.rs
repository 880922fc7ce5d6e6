//! Fallback host memory.
//!
//! The dispatcher stores the host that rescued a request after the preferred
//! host failed, so that following requests go straight to it until its TTL
//! runs out or it fails in turn.

pub mod state;

pub use state::{FallbackRecord, FallbackState};
