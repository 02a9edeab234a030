//! Session-gated HTTP gateway for a racing-simulation data provider.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod resilience;
pub mod session;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
