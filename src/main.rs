// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Liberty Weather API Server
//!
//! Serves weather lookups, interactive weather sessions and alert
//! subscriptions.

use liberty_weather::{config::Config, db, services::CACHE_SWEEP_INTERVAL, AppState};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Liberty Weather API");

    let db = db::from_config(&config);
    let state = Arc::new(AppState::new(config.clone(), db)?);
    tracing::info!(
        geocoder = state.weather.geocoder.provider_name(),
        "Weather services initialized"
    );

    // Background sweepers stop when the server exits
    let shutdown = CancellationToken::new();
    let _sweepers = shutdown.clone().drop_guard();
    state.weather.spawn_cache_sweepers(shutdown.clone());
    state
        .sessions
        .spawn_sweeper(CACHE_SWEEP_INTERVAL, shutdown.clone());

    // Build router
    let app = liberty_weather::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("liberty_weather=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
