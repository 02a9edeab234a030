//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Environment, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |var| std::env::var(var).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto a configuration.
///
/// Recognised: `PORT`, `FRONTEND_URL`, `SESSION_SECRET`, `NODE_ENV`,
/// `PROVIDER_BASE_URL`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        config.listener.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            value: port.clone(),
        })?;
    }
    if let Some(url) = get("FRONTEND_URL") {
        config.cors.frontend_url = url;
    }
    if let Some(secret) = get("SESSION_SECRET") {
        config.session.secret = secret;
    }
    if let Some(env) = get("NODE_ENV") {
        config.environment = Environment::from_env_value(&env);
    }
    if let Some(url) = get("PROVIDER_BASE_URL") {
        config.provider.base_url = url;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = load_config_with(
            None,
            env(&[
                ("PORT", "4000"),
                ("FRONTEND_URL", "https://races.example.com"),
                ("SESSION_SECRET", "0123456789abcdef0123456789abcdef"),
                ("NODE_ENV", "production"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.cors.frontend_url, "https://races.example.com");
        assert!(config.environment.is_production());
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let err = load_config_with(None, env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn test_production_without_secret_fails_fast() {
        let err = load_config_with(None, env(&[("NODE_ENV", "production")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::PlaceholderSecret]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config = load_config_with(None, env(&[("PORT", ""), ("NODE_ENV", " ")])).unwrap();
        assert_eq!(config.listener.port, 3001);
        assert!(!config.environment.is_production());
    }

    #[test]
    fn test_file_then_env() {
        let path = std::env::temp_dir().join(format!("race-gateway-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[listener]\nport = 5000\n\n[session]\nttl_secs = 120\n").unwrap();

        let config = load_config_with(Some(&path), env(&[("PORT", "5001")])).unwrap();
        assert_eq!(config.listener.port, 5001);
        assert_eq!(config.session.ttl_secs, 120);

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_with(Some(Path::new("/nonexistent/gateway.toml")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
