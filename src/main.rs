// src/main.rs

//! # Main Application Entry Point
//!
//! Loads configuration, initializes the shared relay state, optionally starts the
//! Redis push bridge, and serves the WebSocket relay until Ctrl-C.

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod models;
mod routes;
mod services;

use api::state::AppState;
use config::RelayConfig;
use routes::create_router;
use services::redis_service::start_redis_listener;

/// The main entry point for the Tokio runtime.
#[tokio::main]
async fn main() {
    // 1. Setup Logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "room_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting room relay...");

    // 2. Load configuration
    let config = match RelayConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let addr = config.bind_addr;

    // 3. Initialize Shared State
    let state = AppState::new(config);

    // 4. Optional Redis push bridge
    let bridge = state.config.redis_url.clone().map(|url| {
        let manager = (*state.connection_manager).clone();
        let channel = state.config.redis_channel.clone();
        tokio::spawn(start_redis_listener(manager, url, channel))
    });

    // 5. Configure Router and Listener
    let app = create_router(state);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind TCP listener to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Relay listening on ws://{}/ws/<room>", addr);

    // 6. Run the Server
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    if let Some(bridge) = bridge {
        bridge.abort();
    }
    info!("Room relay stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
