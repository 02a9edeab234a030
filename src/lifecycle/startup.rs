//! Startup orchestration.
//!
//! # Responsibilities
//! - Start optional background services (metrics endpoint)
//! - Build the HTTP server and its provider client
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::schema::PLACEHOLDER_SECRET;
use crate::config::GatewayConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Serve with the given configuration until SIGINT/SIGTERM.
pub async fn serve(config: GatewayConfig) -> Result<(), StartupError> {
    if config.session.secret == PLACEHOLDER_SECRET {
        tracing::warn!("Using the placeholder session secret; set SESSION_SECRET before deploying");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server
        .run(listener, server_shutdown)
        .await
        .map_err(StartupError::Serve)
}
