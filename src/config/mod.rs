//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or ClientConfig::default()
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → shared via Arc by resolver, dispatcher, executor and prober
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a client is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use validation::{validate_config, ValidationError};
pub use schema::{
    AgentConfig, ClientConfig, ConnectivityConfig, FallbackConfig, HostConfig,
    ObservabilityConfig, RequestConfig, TimeoutConfig, DEFAULT_CONNECTIVITY_CHECK_URL,
    DEFAULT_PRIMARY_HOST, PROTOCOL_VERSION,
};
