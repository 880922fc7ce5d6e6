//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to a host:
//!     → timeouts.rs (enforce the request deadline)
//!     → On failure: retries.rs (retryable? within the retry window?)
//!     → dispatch moves on to the next host or returns
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every round trip has a deadline
//! - Retries go to a different host, never the same one twice in a sequence
//! - Retry decisions are pure functions of the outcome

pub mod retries;
pub mod timeouts;

pub use retries::{is_retryable_status, should_fallback, RetryWindow};
pub use timeouts::with_request_timeout;
