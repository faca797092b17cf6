//! Scholarly API Server
//!
//! Run with: cargo run --bin scholarly-api
//!
//! # Configuration
//!
//! Read from `config.toml` in the usual locations (see `Config::load_default`),
//! then overridden by environment variables:
//! - `SCHOLARLY_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `SCHOLARLY_API_PORT`: Port to listen on (default: 3000)
//! - `CANVAS_BASE_URL` / `PUBLIC_CANVAS_BASE_URL`: Canvas instance root
//! - `CANVAS_ACCESS_TOKEN` / `PUBLIC_CANVAS_ACCESS_TOKEN`: Canvas API token
//! - `SCHOLARLY_ENV`: development, staging or production (default)
//! - `SCHOLARLY_AUTH_PROVIDER`: disabled or mock (mock needs development)
//! - `RUST_LOG`: Log filter (default: chrona=info,tower_http=debug)

use chrona::api::{serve, AppState, CanvasBackend};
use chrona::auth::build_provider;
use chrona::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();

    // Initialize tracing
    config.logging.init_tracing();

    tracing::info!("Starting Scholarly API server v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    tracing::info!(
        "Environment: {:?}, auth provider: {:?}",
        config.auth.environment,
        config.auth.provider
    );

    // A missing Canvas setup is reported per request, not at startup
    let canvas = CanvasBackend::from_config(config.canvas.resolve());
    match &canvas {
        CanvasBackend::Ready(client) => {
            tracing::info!("Canvas upstream: {}", client.config().base_url)
        }
        CanvasBackend::Unconfigured(reason) => {
            tracing::warn!("{} (Canvas routes will answer 500)", reason)
        }
    }

    let provider = build_provider(&config.auth)?;
    if provider.is_none() {
        tracing::info!("Sign-in disabled (set SCHOLARLY_ENV=development and SCHOLARLY_AUTH_PROVIDER=mock)");
    }

    let state = AppState::new(canvas, config.auth.clone(), config.api.clone()).with_provider(provider);

    // Run server
    tracing::info!("Starting server on {}", config.api.addr());
    serve(state).await?;

    tracing::info!("Scholarly API server stopped");
    Ok(())
}
