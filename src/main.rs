mod api;
mod config;
mod engine;
mod error;
mod geo;
mod geocode;
mod models;
mod observability;
mod state;
mod store;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::geocode::ReverseGeocoder;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let mut app_state = state::AppState::new(config.tracking.clone(), config.event_buffer_size);

    if let Some(url) = &config.geocoder_url {
        let timeout = Duration::from_secs(config.geocoder_timeout_secs);
        app_state.geocoder = Some(ReverseGeocoder::new(url.clone(), timeout)?);
        tracing::info!(geocoder_url = %url, "reverse geocoder enabled");
    }

    let shared_state = Arc::new(app_state);
    let app = api::rest::router(shared_state.clone());

    let sweep_interval = Duration::from_secs(config.retention_sweep_minutes * 60);
    tokio::spawn(engine::retention::run_retention_sweep(
        shared_state.clone(),
        sweep_interval,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
