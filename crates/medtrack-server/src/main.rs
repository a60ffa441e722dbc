//! # medtrack-server
//!
//! HTTP backend for the MedTrack medication-adherence tracker.
//!
//! This binary provides:
//! - **REST API** (axum) for medications, their daily dose logs and the
//!   dashboard aggregates (weekly adherence, missed doses, next dose)
//! - **AI insights** generated by a chat completion provider, with a fixed
//!   fallback whenever the provider is unavailable
//! - **Health and Prometheus metrics** endpoints
//!
//! All state is held in memory and discarded on shutdown.

mod api;
mod config;
mod dashboard;
mod error;
mod insights;
mod metrics;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use medtrack_shared::constants::APP_NAME;
use medtrack_store::MemStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,medtrack_server=debug,medtrack_store=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Empty in-memory store; "today" follows the configured clock policy.
    let store = MemStore::with_clock(config.clock.clock());

    // Provider-backed insights when an API key is set, static otherwise.
    let insights = insights::from_config(&config);

    let http_addr = config.http_addr;
    let app_state = AppState::new(store, insights, config);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
