use std::sync::Arc;

use fare_router::api;
use fare_router::config::{Config, LogFormat};
use fare_router::engine::dispatch::run_dispatch_worker;
use fare_router::engine::orchestrator::run_session_sweeper;
use fare_router::error::AppError;
use fare_router::state::{AppState, Providers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Json => subscriber.json().init(),
    }

    let providers = Providers::from_config(&config)?;
    let (app_state, ride_rx) =
        AppState::new(providers, config.ride_queue_size, config.event_buffer_size);
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(run_dispatch_worker(shared_state.clone(), ride_rx));
    tokio::spawn(run_session_sweeper(shared_state.clone(), config.session_idle_ttl));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        geocoder = %config.geocoder_base_url,
        router = %config.router_base_url,
        "http server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
