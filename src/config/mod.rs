//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT, FRONTEND_URL, SESSION_SECRET, NODE_ENV, PROVIDER_BASE_URL)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CorsConfig, Environment, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProviderConfig, SessionConfig, TimeoutConfig,
};
pub use validation::ValidationError;
