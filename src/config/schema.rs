//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Cookie-signing secret used when none is configured.
///
/// Accepted in development only; validation rejects it in production.
pub const PLACEHOLDER_SECRET: &str = "change-me-insecure-session-secret";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment; drives cookie policy and secret checks.
    pub environment: Environment,

    /// Listener configuration (bind host, port, body limit).
    pub listener: ListenerConfig,

    /// Cross-origin settings for the browser frontend.
    pub cors: CorsConfig,

    /// Session cookie and store settings.
    pub session: SessionConfig,

    /// Racing-data provider settings.
    pub provider: ProviderConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Interpret a `NODE_ENV`-style value. Only `"production"` selects
    /// production; anything else is development.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// The single origin allowed to make credentialed requests.
    pub frontend_url: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC key for signing session cookies.
    pub secret: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Idle lifetime of a session in seconds.
    pub ttl_secs: u64,

    /// How often expired sessions are purged, in seconds.
    pub reap_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            secret: PLACEHOLDER_SECRET.to_string(),
            cookie_name: "gateway.sid".to_string(),
            ttl_secs: 24 * 60 * 60,
            reap_interval_secs: 60,
        }
    }
}

/// Racing-data provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the provider's members data API.
    pub base_url: String,

    /// Deadline for a single provider operation, in seconds.
    pub call_timeout_secs: u64,

    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://members-ng.iracing.com".to_string(),
            call_timeout_secs: 20,
            connect_timeout_secs: 5,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Graceful shutdown drain deadline in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.port, 3001);
        assert_eq!(config.cors.frontend_url, "http://localhost:5173");
        assert_eq!(config.session.secret, PLACEHOLDER_SECRET);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.listener.bind_address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_environment_from_env_value() {
        assert_eq!(Environment::from_env_value("production"), Environment::Production);
        assert_eq!(Environment::from_env_value("PRODUCTION "), Environment::Production);
        assert_eq!(Environment::from_env_value("development"), Environment::Development);
        assert_eq!(Environment::from_env_value(""), Environment::Development);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            environment = "production"

            [listener]
            port = 8080

            [session]
            ttl_secs = 600
            "#,
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.session.ttl_secs, 600);
        assert_eq!(config.session.cookie_name, "gateway.sid");
        assert_eq!(config.provider.call_timeout_secs, 20);
    }
}
