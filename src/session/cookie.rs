//! Signed session cookies.
//!
//! Cookie value format: `<session id>.<signature>` where the signature is
//! HMAC-SHA256(secret, session id), URL-safe base64 without padding.

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Environment;
use crate::session::{SessionError, SessionId};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies session ids.
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl CookieSigner {
    pub fn new(secret: &[u8]) -> Result<Self, SessionError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SessionError::Cookie(format!("invalid signing key: {e}")))?;
        Ok(Self { mac })
    }

    /// Produce the cookie value for `id`.
    pub fn sign(&self, id: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.as_str().as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", id.as_str(), signature)
    }

    /// Recover the session id from a cookie value if its signature holds.
    pub fn verify(&self, value: &str) -> Option<SessionId> {
        let (id, signature) = value.rsplit_once('.')?;
        if id.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature).ok()?;
        Some(SessionId::from_verified(id))
    }
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie attributes that depend on the deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age_secs: u64,
}

impl CookiePolicy {
    /// Production: `Secure; SameSite=None` for a cross-site frontend.
    /// Otherwise: `SameSite=Lax`, not secure, so plain-HTTP dev works.
    pub fn for_environment(name: impl Into<String>, env: Environment, max_age_secs: u64) -> Self {
        let production = env.is_production();
        Self {
            name: name.into(),
            secure: production,
            same_site: if production { SameSite::None } else { SameSite::Lax },
            max_age_secs,
        }
    }

    /// `Set-Cookie` value carrying a signed session id.
    pub fn issue(&self, value: &str) -> Result<HeaderValue, SessionError> {
        self.render(value, self.max_age_secs)
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn clear(&self) -> Result<HeaderValue, SessionError> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: u64) -> Result<HeaderValue, SessionError> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; Max-Age={}; SameSite={}",
            self.name,
            value,
            max_age,
            self.same_site.as_str()
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).map_err(|e| SessionError::Cookie(e.to_string()))
    }
}

/// All values of cookie `name` in the request's `Cookie` headers, in order.
pub fn cookie_values<'a>(headers: &'a HeaderMap, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(move |pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.trim_matches('"'))
        })
}
