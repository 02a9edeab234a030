//! Request identification and tracing spans.
//!
//! # Responsibilities
//! - Name the request id header shared by the id layers and the span
//! - Build the per-request tracing span
//! - Record per-route request metrics
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Metrics are labelled with the matched route template, not the raw path

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, Request},
    http::{HeaderMap, Request as HttpRequest},
    middleware::Next,
    response::Response,
};
use tracing::Span;

use crate::observability::metrics;

/// Header carrying the request id in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id from headers, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span factory for `TraceLayer`.
pub fn make_request_span(request: &HttpRequest<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request.headers()),
    )
}

/// Middleware recording request count and latency per route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
