// File Path: src/api/rooms.rs
//! Room API Handlers
//! Server-initiated push and online/room counts.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::{
    api::state::AppState,
    models::{ApiError, ApiResult, OnlineResponse, PushRequest, PushResponse, RoomResponse},
};

/// Pushes a message to every member of a room.
///
/// A room with no members is not an error; the response simply reports zero recipients.
pub async fn push_to_room(
    Path(room): Path<String>,
    State(state): State<AppState>,
    body: Result<Json<PushRequest>, JsonRejection>,
) -> ApiResult<Json<PushResponse>> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_room_key(&room, state.config.max_room_key_len)?;

    let report = state
        .connection_manager
        .push_to_room(&room, &request.message)
        .await;

    Ok(Json(PushResponse::new(&room, report)))
}

pub async fn get_online(State(state): State<AppState>) -> Json<OnlineResponse> {
    Json(OnlineResponse {
        online: state.connection_manager.online_count(),
        rooms: state.connection_manager.room_count(),
    })
}

pub async fn get_room(
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<RoomResponse>> {
    validate_room_key(&room, state.config.max_room_key_len)?;
    let members = state.connection_manager.member_count(&room);
    Ok(Json(RoomResponse { room, members }))
}

/// Rejects empty or over-long room keys.
pub fn validate_room_key(room: &str, max_len: usize) -> ApiResult<()> {
    if room.trim().is_empty() {
        return Err(ApiError::BadRequest("room key must not be empty".to_string()));
    }
    if room.len() > max_len {
        return Err(ApiError::BadRequest(format!(
            "room key exceeds {} bytes",
            max_len
        )));
    }
    Ok(())
}
