//! Racing data session gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                   SESSION GATEWAY                     │
//!                    │                                                       │
//!   Browser request  │  ┌──────────┐   ┌──────────┐   ┌──────────────┐      │
//!   ─────────────────┼─▶│ request  │──▶│ session  │──▶│   handlers   │      │
//!                    │  │ id/trace │   │  layer   │   │ (auth gate)  │      │
//!                    │  │ cors     │   └────┬─────┘   └──────┬───────┘      │
//!                    │  └──────────┘        │                │              │
//!                    │                ┌─────▼─────┐   ┌──────▼───────┐      │     Racing
//!                    │                │  session  │   │   timeout    │──────┼───▶ data
//!                    │                │   store   │   │   provider   │◀─────┼──── provider
//!                    │                └───────────┘   └──────────────┘      │
//!                    └──────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from an optional TOML file (`--config`) overlaid with
//! `PORT`, `FRONTEND_URL`, `SESSION_SECRET`, `NODE_ENV` and
//! `PROVIDER_BASE_URL`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use race_gateway::config::{load_config, ObservabilityConfig};
use race_gateway::lifecycle;
use race_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "race-gateway")]
#[command(about = "Session-gated gateway for racing simulation results", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => {
            init_logging(&config.observability);
            config
        }
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address(),
        provider = %config.provider.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "race-gateway starting"
    );

    if let Err(e) = lifecycle::serve(config).await {
        tracing::error!(error = %e, "Gateway stopped with error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
