//! Host resolution subsystem.
//!
//! # Data Flow
//! ```text
//! HostConfig (primary, fallbacks, environment)
//!     + ConnectionHostSource (optional, read-only)
//!     → resolver.rs
//!     → HostList (ordered, deduplicated, length >= 1)
//! ```
//!
//! # Design Decisions
//! - Pure configuration lookup, no network probing
//! - A live realtime host is preferred but still backed by every fallback
//! - No shuffling or latency ranking; order is configuration order

pub mod resolver;

pub use resolver::{ConnectionHostSource, HostList, HostResolver};
