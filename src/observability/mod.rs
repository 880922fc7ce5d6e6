//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and executor produce:
//!     → logging.rs (subscriber setup for binaries)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!     → tracing.rs (dispatch spans, request ids)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every host attempt of one dispatch
//! - Metrics are cheap and no-ops without a recorder

pub mod logging;
pub mod metrics;
pub mod tracing;
