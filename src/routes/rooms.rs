// File Path: src/routes/rooms.rs

//! Room Routes
//!
//! Server push and online/room counts.

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{rooms, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/online", get(rooms::get_online))
        .route("/api/rooms/:room", get(rooms::get_room))
        .route("/api/rooms/:room/push", post(rooms::push_to_room))
}
