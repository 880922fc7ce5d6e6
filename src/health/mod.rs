//! Connectivity checking subsystem.
//!
//! # Data Flow
//! ```text
//! check_connectivity()
//!     → connectivity.rs (single GET on the up-check URL)
//!     → Transport (no fallback, no retry)
//!     → true iff success and body == "yes"
//! ```
//!
//! # Design Decisions
//! - On-demand only; no background polling
//! - Never raises; callers get a boolean

pub mod connectivity;

pub use connectivity::ConnectivityProber;
