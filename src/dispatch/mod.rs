//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor (caller)
//!     → headers.rs (Accept, protocol version, Authorization, request id)
//!     → dispatcher.rs
//!         → FallbackState (stored host?)
//!         → HostResolver (candidate hosts)
//!         → Transport (one attempt per host)
//!     → ResponseOutcome
//! ```
//!
//! # Design Decisions
//! - Attempts are strictly sequential; no hedged requests
//! - Only retryable failures move to the next host
//! - A host that rescued a request is remembered for a TTL

pub mod dispatcher;
pub mod headers;

pub use dispatcher::RequestDispatcher;
pub use headers::{AuthHeaderSource, BasicKeyAuth, DefaultHeaders, VERSION_HEADER};
