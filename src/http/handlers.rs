//! Route handlers.
//!
//! Protected routes check the session before touching the provider; every
//! provider failure is logged here and converted to its generic [`ApiError`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::provider::{Credentials, ProviderError, SubsessionId};
use crate::session::Session;

/// `GET /health`: liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/login`: authenticate with the provider and mark the session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let credentials = match body {
        Ok(Json(credentials)) => credentials,
        Err(rejection @ (JsonRejection::JsonSyntaxError(_) | JsonRejection::BytesRejection(_))) => {
            tracing::warn!(reason = %rejection.body_text(), "Rejected malformed login body");
            return Err(ApiError::InvalidBody(rejection.body_text()));
        }
        // Wrong content type or field types count as absent credentials.
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "Unusable login body");
            Credentials::default()
        }
    };

    let result = if credentials.is_complete() {
        state.provider.authenticate(&credentials).await
    } else {
        Err(ProviderError::MissingCredentials)
    };

    match result {
        Ok(()) => {
            session.mark_authenticated();
            metrics::record_login("success");
            tracing::info!("Login succeeded");
            Ok(Json(json!({ "success": true })))
        }
        Err(e) => {
            metrics::record_login("failure");
            tracing::warn!(error = %e, "Login failed");
            Err(ApiError::AuthenticationFailed(e))
        }
    }
}

/// `POST /api/logout`: forget the session. Succeeds whether or not one existed.
pub async fn logout(session: Session) -> Json<Value> {
    let was_authenticated = session.is_authenticated();
    session.destroy();
    tracing::info!(was_authenticated, "Session destroyed");
    Json(json!({ "success": true }))
}

/// `GET /api/recent-races`
pub async fn recent_races(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>, ApiError> {
    require_authenticated(&session)?;

    state.provider.recent_races().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch recent races");
        ApiError::RecentRaces(e)
    })
}

/// `GET /api/race/{subsession_id}`
pub async fn race_result(
    State(state): State<AppState>,
    session: Session,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    require_authenticated(&session)?;

    let subsession_id: SubsessionId = raw_id.parse().map_err(|e| {
        tracing::debug!(error = %e, "Rejected subsession id");
        ApiError::InvalidSubsessionId
    })?;

    state
        .provider
        .race_result(subsession_id)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(%subsession_id, error = %e, "Failed to fetch race result");
            ApiError::RaceResult(e)
        })
}

fn require_authenticated(session: &Session) -> Result<(), ApiError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(ApiError::NotAuthenticated)
    }
}
