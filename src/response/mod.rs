//! Response classification subsystem.
//!
//! # Data Flow
//! ```text
//! executor result
//!     ├─ no response (TransportError) → classify_transport_error → Failure{retryable per kind}
//!     └─ status + headers + bytes
//!           → body.rs (decode by content type: JSON, MessagePack, raw)
//!           → classifier.rs
//!                 status < 300  → Success
//!                 status >= 300 → Failure{error payload | error headers | generic}
//! ```
//!
//! # Design Decisions
//! - One ErrorInfo shape for every failure source
//! - Retryability is decided here (network kind or 500-504), consumed by dispatch

pub mod body;
pub mod classifier;
pub mod outcome;

pub use body::{ContentKind, ResponseBody};
pub use classifier::{classify_response, classify_transport_error};
pub use outcome::{FailureResponse, ResponseOutcome, RestResponse, SuccessResponse};
