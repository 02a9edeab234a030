//! Mapping of gateway failures to HTTP responses.
//!
//! Every client-visible failure is a flat `{ "error": string }` body with a
//! fixed message per variant. Underlying causes are logged where they are
//! caught and never rendered into the body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::provider::ProviderError;
use crate::session::SessionError;

/// Errors surfaced by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Provider rejected the login or could not be reached during login.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[source] ProviderError),

    /// Protected route called without an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Provider failure while fetching recent races.
    #[error("recent races unavailable: {0}")]
    RecentRaces(#[source] ProviderError),

    /// Provider failure while fetching a race result.
    #[error("race result unavailable: {0}")]
    RaceResult(#[source] ProviderError),

    /// Path parameter is not a subsession id.
    #[error("invalid subsession id")]
    InvalidSubsessionId,

    /// Request body could not be decoded.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Session store or cookie failure.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailed(_) | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::RecentRaces(_) | ApiError::RaceResult(_) | ApiError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidSubsessionId | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The message shown to clients. Never includes provider detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::AuthenticationFailed(_) => "Authentication failed",
            ApiError::NotAuthenticated => "Not authenticated",
            ApiError::RecentRaces(_) => "Failed to fetch recent races",
            ApiError::RaceResult(_) => "Failed to fetch race result",
            ApiError::InvalidSubsessionId => "Invalid subsession id",
            ApiError::InvalidBody(_) => "Invalid request body",
            ApiError::Session(_) => "Session unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
