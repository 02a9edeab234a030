//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, port non-zero)
//! - Check URLs parse (frontend origin, provider base)
//! - Refuse an unsafe session secret in production
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, PLACEHOLDER_SECRET};

/// Minimum secret length accepted in production.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must not be 0")]
    ZeroPort,

    #[error("{field} must be greater than 0")]
    ZeroValue { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("cors.frontend_url must be a bare origin (scheme://host[:port])")]
    NotAnOrigin,

    #[error("session.secret is empty")]
    EmptySecret,

    #[error("session.secret is the built-in placeholder; set SESSION_SECRET in production")]
    PlaceholderSecret,

    #[error("session.secret must be at least {MIN_SECRET_LEN} bytes in production")]
    WeakSecret,

    #[error("session.cookie_name contains characters not allowed in a cookie name")]
    InvalidCookieName,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "listener.max_body_bytes" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "timeouts.request_secs" });
    }
    if config.provider.call_timeout_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "provider.call_timeout_secs" });
    }
    if config.session.ttl_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "session.ttl_secs" });
    } else if config.session.ttl_secs > MAX_SESSION_TTL_SECS {
        errors.push(ValidationError::TooLarge {
            field: "session.ttl_secs",
            max: MAX_SESSION_TTL_SECS,
        });
    }
    if config.session.reap_interval_secs == 0 {
        errors.push(ValidationError::ZeroValue { field: "session.reap_interval_secs" });
    }

    match Url::parse(&config.cors.frontend_url) {
        Ok(url) => {
            if url.path() != "/" || url.query().is_some() || config.cors.frontend_url.ends_with('/') {
                errors.push(ValidationError::NotAnOrigin);
            }
        }
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field: "cors.frontend_url",
            reason: e.to_string(),
        }),
    }

    if let Err(e) = Url::parse(&config.provider.base_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "provider.base_url",
            reason: e.to_string(),
        });
    }

    let name = &config.session.cookie_name;
    if name.is_empty() || !name.bytes().all(is_cookie_name_byte) {
        errors.push(ValidationError::InvalidCookieName);
    }

    let secret = &config.session.secret;
    if secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    } else if config.environment.is_production() {
        if secret == PLACEHOLDER_SECRET {
            errors.push(ValidationError::PlaceholderSecret);
        } else if secret.len() < MIN_SECRET_LEN {
            errors.push(ValidationError::WeakSecret);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// RFC 6265 token characters.
fn is_cookie_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
