//! Session middleware and extractor.
//!
//! # Responsibilities
//! - Resolve the session cookie to a [`Session`] before the handler runs
//! - Write the session back after the handler: persist, refresh or destroy
//! - Let handlers take `Session` as an argument
//!
//! # Design Decisions
//! - Unknown, expired or forged cookies silently yield a fresh anonymous session
//! - Store failures fail the request with a generic 500

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::{Environment, SessionConfig};
use crate::http::error::ApiError;
use crate::session::cookie::{cookie_values, CookiePolicy, CookieSigner};
use crate::session::store::SessionStore;
use crate::session::{Change, Session, SessionError, SessionId};

/// Everything the session middleware needs, shared across requests.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    policy: CookiePolicy,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        config: &SessionConfig,
        environment: Environment,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            store,
            signer: CookieSigner::new(config.secret.as_bytes())?,
            policy: CookiePolicy::for_environment(&config.cookie_name, environment, config.ttl_secs),
        })
    }

    /// Find the stored session named by the request's cookie, or start a
    /// new anonymous one.
    pub async fn load(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        for value in cookie_values(headers, &self.policy.name) {
            let Some(id) = self.signer.verify(value) else {
                tracing::debug!("Ignoring session cookie with bad signature");
                continue;
            };
            if let Some(record) = self.store.get(&id).await? {
                return Ok(Session::existing(id, record));
            }
        }
        Ok(Session::fresh())
    }

    /// Apply whatever the handler did to the session.
    pub async fn commit(&self, session: &Session, response: &mut Response) -> Result<(), SessionError> {
        let (id, record, stored, change) = session.snapshot();

        match change {
            Change::Modified => {
                self.store.set(&id, record).await?;
                self.issue_cookie(&id, response)?;
            }
            Change::Destroyed => {
                if stored {
                    self.store.expire(&id).await?;
                }
                response.headers_mut().append(SET_COOKIE, self.policy.clear()?);
            }
            // Rolling expiry: the browser's Max-Age moves with the store deadline.
            Change::None if stored => {
                self.store.touch(&id).await?;
                self.issue_cookie(&id, response)?;
            }
            Change::None => {}
        }
        Ok(())
    }

    fn issue_cookie(&self, id: &SessionId, response: &mut Response) -> Result<(), SessionError> {
        let cookie = self.policy.issue(&self.signer.sign(id))?;
        response.headers_mut().append(SET_COOKIE, cookie);
        Ok(())
    }
}

/// Axum middleware attaching a [`Session`] to every request.
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match manager.load(request.headers()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load session");
            return ApiError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(session.clone());
    let mut response = next.run(request).await;

    if let Err(e) = manager.commit(&session, &mut response).await {
        tracing::error!(error = %e, "Failed to save session");
        return ApiError::from(e).into_response();
    }
    response
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(ApiError::Session(SessionError::MissingLayer))
    }
}
