//! REST transport for a pub/sub client.
//!
//! Issues HTTP requests against a primary REST host and transparently falls
//! back to alternate hosts when the preferred one is unreachable or returns
//! a server error.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                     REST CLIENT                       │
//!                      │                                                       │
//!   request(...)       │  ┌──────────┐    ┌────────────┐    ┌──────────────┐  │
//!   ───────────────────┼─▶│ dispatch │───▶│  fallback  │    │    hosts     │  │
//!                      │  │ headers  │    │ stored host│    │   resolver   │  │
//!                      │  └────┬─────┘    └────────────┘    └──────────────┘  │
//!                      │       │ one attempt per host                          │
//!                      │       ▼                                               │
//!   RestResponse       │  ┌──────────┐    ┌────────────┐    ┌──────────────┐  │
//!   ◀──────────────────┼──│ response │◀───│ transport  │───▶│  agent pool  │──┼──▶ REST hosts
//!                      │  │classifier│    │  executor  │    │ (plain, TLS) │  │
//!                      │  └──────────┘    └────────────┘    └──────────────┘  │
//!                      │                                                       │
//!   check_connectivity │  ┌──────────┐                                        │
//!   ───────────────────┼─▶│  health  │──── single GET ───────────────────────┼──▶ up-check URL
//!                      │  └──────────┘                                        │
//!                      │                                                       │
//!                      │  Cross-cutting: config, resilience, observability     │
//!                      └──────────────────────────────────────────────────────┘
//! ```

// Entry point
pub mod client;
pub mod error;

// Request path
pub mod dispatch;
pub mod fallback;
pub mod hosts;
pub mod response;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod health;
pub mod observability;
pub mod resilience;

pub use client::RestClient;
pub use config::ClientConfig;
pub use dispatch::{AuthHeaderSource, BasicKeyAuth};
pub use error::{ClientError, ErrorCode, ErrorInfo, TransportError};
pub use hosts::{ConnectionHostSource, HostList, HostResolver};
pub use response::{ResponseBody, ResponseOutcome, RestResponse};
pub use transport::{AgentPool, RequestDescriptor, RequestTarget, Transport, TransportExecutor};
