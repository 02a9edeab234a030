//! HTTP client for the provider's members data API.
//!
//! # Responsibilities
//! - Log in with the provider's hashed-password scheme
//! - Keep the provider's auth cookies for later data calls
//! - Follow `link` indirections on data endpoints
//! - Translate HTTP failures into [`ProviderError`]

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::StatusCode;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ProviderConfig;
use crate::provider::types::{Credentials, ProviderError, ProviderResult, SubsessionId};
use crate::provider::RaceDataProvider;

const AUTH_PATH: &str = "auth";
const RECENT_RACES_PATH: &str = "data/stats/member_recent_races";
const RACE_RESULT_PATH: &str = "data/results/get";

/// Provider client over HTTPS with a shared cookie jar.
#[derive(Debug, Clone)]
pub struct HttpProviderClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpProviderClient {
    /// Build a client from configuration.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::Config(format!("base_url {:?}: {}", config.base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("race-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Config(format!("endpoint {path:?}: {e}")))
    }

    /// GET a data endpoint, following a `link` indirection if present.
    async fn fetch_data(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<Value> {
        let body = self.get_json(self.endpoint(path)?, query).await?;

        match body.get("link").and_then(Value::as_str) {
            Some(link) => {
                let link = Url::parse(link)
                    .map_err(|e| ProviderError::Malformed(format!("bad link in {path}: {e}")))?;
                tracing::debug!(endpoint = %path, "Following provider data link");
                self.get_json(link, &[]).await
            }
            None => Ok(body),
        }
    }

    async fn get_json(&self, url: Url, query: &[(&str, String)]) -> ProviderResult<Value> {
        let endpoint = url.path().to_string();
        let response = self.http.get(url).query(query).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthorized),
            status if !status.is_success() => Err(ProviderError::Status {
                status: status.as_u16(),
                endpoint,
            }),
            _ => response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl RaceDataProvider for HttpProviderClient {
    async fn authenticate(&self, credentials: &Credentials) -> ProviderResult<()> {
        if !credentials.is_complete() {
            return Err(ProviderError::MissingCredentials);
        }

        let url = self.endpoint(AUTH_PATH)?;
        let endpoint = url.path().to_string();
        let body = json!({
            "email": credentials.username,
            "password": encode_password(&credentials.username, &credentials.password),
        });

        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                endpoint,
            });
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        check_auth_reply(&reply)
    }

    async fn recent_races(&self) -> ProviderResult<Value> {
        self.fetch_data(RECENT_RACES_PATH, &[]).await
    }

    async fn race_result(&self, subsession_id: SubsessionId) -> ProviderResult<Value> {
        self.fetch_data(RACE_RESULT_PATH, &[("subsession_id", subsession_id.to_string())])
            .await
    }
}

/// Provider password digest: `base64(sha256(password + lowercase(email)))`.
pub fn encode_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(username.to_lowercase().as_bytes());
    BASE64.encode(hasher.finalize())
}

/// The auth endpoint answers 200 even for bad credentials; `authcode == 0`
/// marks a rejection.
fn check_auth_reply(reply: &Value) -> ProviderResult<()> {
    let rejected = match reply.get("authcode") {
        None => return Err(ProviderError::Malformed("auth reply without authcode".into())),
        Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::Number(n)) => n.as_i64() == Some(0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(_) => false,
    };

    if rejected {
        let message = reply
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("credentials rejected");
        return Err(ProviderError::Rejected(message.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_password_lowercases_email() {
        let a = encode_password("User@Example.com", "secret");
        let b = encode_password("user@example.com", "secret");
        assert_eq!(a, b);
        assert_ne!(a, encode_password("user@example.com", "Secret"));
        // sha256 digest is 32 bytes → 44 base64 characters
        assert_eq!(a.len(), 44);
    }

    #[test]
    fn test_check_auth_reply() {
        assert!(check_auth_reply(&json!({"authcode": "abc123", "custId": 1})).is_ok());
        assert!(check_auth_reply(&json!({"authcode": 42})).is_ok());

        match check_auth_reply(&json!({"authcode": 0, "message": "Invalid email address or password."})) {
            Err(ProviderError::Rejected(msg)) => assert!(msg.contains("Invalid email")),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(matches!(
            check_auth_reply(&json!({"status": "ok"})),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:9/provider".into(),
            ..ProviderConfig::default()
        };
        let client = HttpProviderClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(RACE_RESULT_PATH).unwrap().as_str(),
            "http://127.0.0.1:9/provider/data/results/get"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = ProviderConfig {
            base_url: "not a url".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(HttpProviderClient::new(&config), Err(ProviderError::Config(_))));
    }

    #[tokio::test]
    async fn test_incomplete_credentials_skip_network() {
        let config = ProviderConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..ProviderConfig::default()
        };
        let client = HttpProviderClient::new(&config).unwrap();
        let err = client
            .authenticate(&Credentials::new("user1", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
    }
}
