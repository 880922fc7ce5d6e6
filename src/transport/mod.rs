//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor (dispatch layer)
//!     → request.rs (concrete HttpRequest for the attempted host)
//!     → executor.rs (deadline, send, collect body)
//!     → agent.rs (pooled plaintext or TLS connection)
//!     → response::classify_* (ResponseOutcome)
//! ```
//!
//! # Design Decisions
//! - One attempt per call; fallback across hosts lives in `dispatch`
//! - Errors are values: every call yields a `ResponseOutcome`
//! - Agents are shared through `Arc<AgentPool>` and built lazily

pub mod agent;
pub mod executor;
pub mod request;

pub use agent::AgentPool;
pub use executor::{Transport, TransportExecutor};
pub use request::{HttpRequest, RequestDescriptor, RequestTarget, UriBuilder};
