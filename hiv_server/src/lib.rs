//! HIV Dynamics Simulator - HTTP service
//!
//! Wraps [`hiv_core::simulate`] behind a JSON endpoint:
//!
//! ```text
//!   client ──POST /simulate──► CORS ──► JSON schema ──► validate ──► simulate
//!          ◄── { time, T, V, L } ─────────────────────────────────────┘
//! ```
//!
//! The router is stateless apart from read-only limits; every request runs
//! its own simulation to completion.

mod api;
mod config;
mod cors;
mod error;

pub use api::{
    build_router, AppState, HealthResponse, ScenarioInfo, SimulateQuery, SimulateResponse,
    SimulationRequest,
};
pub use config::{ServerConfig, DEFAULT_PORT};
pub use cors::{AllowedOrigins, CorsPolicy};
pub use error::{ApiError, ServerError};

use tokio::net::TcpListener;
use tracing::info;

/// Binds `config.addr` and serves until Ctrl+C.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.addr).await?;
    let local_addr = listener.local_addr()?;

    let app = build_router(AppState::new(config.limits), &config.cors);

    info!(
        addr = %local_addr,
        max_steps = config.limits.max_steps,
        credentials = config.cors.allow_credentials,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
