// src/routes/mod.rs

//! # Routes Module
//!
//! Defines the main routing structure for the Axum server.

use axum::{routing::get, Router};
use crate::api::state::AppState;

pub mod health;
pub mod rooms;
pub mod websocket;

/// Creates and configures the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // One room per path segment: clients connect to `/ws/<room>`
        .route("/ws/:room", get(websocket::websocket_handler))
        .merge(health::routes())
        .merge(rooms::routes())
        .with_state(state)
}
