//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, CORS, timeout, body limit)
//! - Install the session layer on `/api` routes
//! - Wrap the provider with per-call deadlines
//! - Bind server to listener and drain on shutdown

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{CorsConfig, GatewayConfig};
use crate::http::handlers::{health, login, logout, race_result, recent_races};
use crate::http::request::{make_request_span, track_metrics};
use crate::provider::{HttpProviderClient, ProviderError, RaceDataProvider};
use crate::resilience::TimeoutProvider;
use crate::session::{session_middleware, spawn_reaper, MemorySessionStore, SessionError, SessionManager};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn RaceDataProvider>,
    pub sessions: SessionManager,
}

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("provider client: {0}")]
    Provider(#[from] ProviderError),

    #[error("session layer: {0}")]
    Session(#[from] SessionError),

    #[error("invalid CORS origin {0:?}")]
    CorsOrigin(String),
}

/// HTTP server for the session gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    store: Arc<MemorySessionStore>,
}

impl HttpServer {
    /// Create a server talking to the provider configured in `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let client = HttpProviderClient::new(&config.provider)?;
        Self::with_provider(config, Arc::new(client))
    }

    /// Create a server around an arbitrary provider implementation.
    pub fn with_provider(
        config: GatewayConfig,
        provider: Arc<dyn RaceDataProvider>,
    ) -> Result<Self, ServerError> {
        let provider: Arc<dyn RaceDataProvider> = Arc::new(TimeoutProvider::new(
            provider,
            Duration::from_secs(config.provider.call_timeout_secs),
        ));

        let store = Arc::new(MemorySessionStore::new(Duration::from_secs(
            config.session.ttl_secs,
        )));
        let sessions = SessionManager::new(store.clone(), &config.session, config.environment)?;

        let state = AppState { provider, sessions };
        let router = Self::build_router(&config, state)?;

        Ok(Self {
            router,
            config,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Result<Router, ServerError> {
        let api = Router::new()
            .route("/api/login", post(login))
            .route("/api/logout", post(logout))
            .route("/api/recent-races", get(recent_races))
            .route("/api/race/{subsession_id}", get(race_result))
            .route_layer(middleware::from_fn_with_state(
                state.sessions.clone(),
                session_middleware,
            ));

        Ok(Router::new()
            .route("/health", get(health))
            .merge(api)
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors)?)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The session store backing this server.
    pub fn session_store(&self) -> Arc<MemorySessionStore> {
        self.store.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires, then drain in-flight requests for at most
    /// `timeouts.shutdown_secs`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = ?self.config.environment,
            frontend_url = %self.config.cors.frontend_url,
            "HTTP server starting"
        );

        let reaper = spawn_reaper(
            self.store.clone(),
            Duration::from_secs(self.config.session.reap_interval_secs),
            shutdown.resubscribe(),
        );

        let drain_deadline = Duration::from_secs(self.config.timeouts.shutdown_secs);
        let mut drain_started = shutdown.resubscribe();

        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                let _ = drain_started.recv().await;
                tokio::time::sleep(drain_deadline).await;
            } => {
                tracing::warn!(
                    deadline_secs = drain_deadline.as_secs(),
                    "Drain deadline elapsed, dropping remaining connections"
                );
            }
        }

        if let Err(e) = reaper.await {
            tracing::warn!(error = %e, "Session reaper ended abnormally");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Single credentialed origin, as a browser frontend needs for cookies.
fn cors_layer(config: &CorsConfig) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(&config.frontend_url)
        .map_err(|_| ServerError::CorsOrigin(config.frontend_url.clone()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request()))
}
