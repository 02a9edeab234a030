//! Provider-facing types and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Login credentials forwarded once to the provider.
///
/// `Debug` is redacted so credentials can't leak through logging.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identifier of one race result in the provider's data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubsessionId(u64);

impl SubsessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubsessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected subsession id input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid subsession id: {0:?}")]
pub struct InvalidSubsessionId(pub String);

impl FromStr for SubsessionId {
    type Err = InvalidSubsessionId;

    /// Accepts plain decimal digits only: no sign, whitespace or zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSubsessionId(s.to_string());

        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(id) => Ok(SubsessionId(id)),
        }
    }
}

/// Errors that can occur while talking to the racing-data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the credentials.
    #[error("provider rejected credentials: {0}")]
    Rejected(String),

    /// Credentials were incomplete; the provider was not contacted.
    #[error("username and password are required")]
    MissingCredentials,

    /// The provider-side login is missing or has lapsed.
    #[error("provider session is not authenticated")]
    Unauthorized,

    /// Non-success HTTP status from the provider.
    #[error("provider returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Connection, TLS or protocol failure.
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be understood.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The call did not finish within its deadline.
    #[error("provider call timed out after {0} seconds")]
    Timeout(u64),

    /// Client could not be constructed from configuration.
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

impl ProviderError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Rejected(_) => "rejected",
            ProviderError::MissingCredentials => "missing_credentials",
            ProviderError::Unauthorized => "unauthorized",
            ProviderError::Status { .. } => "status",
            ProviderError::Transport(_) => "transport",
            ProviderError::Malformed(_) => "malformed",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Config(_) => "config",
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
