// File Path: src/models/mod.rs

// =========================================================================================
// SECTION 1: IMPORTS
// =========================================================================================

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::connection::ConnectionId;

// =========================================================================================
// SECTION 2: RELAY ERRORS
// =========================================================================================

pub type RelayResult<T> = Result<T, RelayError>;

/// Failures raised by the relay core.
///
/// Leaving a room twice and pushing to an unknown room are deliberately absent:
/// both resolve to no-ops.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("send to connection {connection} failed: {reason}")]
    SendFailed {
        connection: ConnectionId,
        reason: String,
    },

    #[error("send to connection {connection} timed out after {timeout:?}")]
    SendTimeout {
        connection: ConnectionId,
        timeout: Duration,
    },

    #[error("online counter would drop below zero")]
    CounterUnderflow,
}

// =========================================================================================
// SECTION 3: API ERROR HANDLING
// =========================================================================================

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": error_message,
            "status": status.as_u16()
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(inner: RelayError) -> Self {
        ApiError::InternalError(inner.to_string())
    }
}

// =========================================================================================
// SECTION 4: PUSH MODELS
// =========================================================================================

/// Body of `POST /api/rooms/:room/push`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub message: String,
}

/// Message envelope accepted by the Redis push bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPush {
    pub room: String,
    pub message: String,
}

/// Outcome of a single fan-out to a room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Members present in the snapshot, minus any excluded sender.
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResponse {
    pub room: String,
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
    pub pushed_at: DateTime<Utc>,
}

impl PushResponse {
    pub fn new(room: &str, report: BroadcastReport) -> Self {
        Self {
            room: room.to_string(),
            recipients: report.recipients,
            delivered: report.delivered,
            failed: report.failed,
            pushed_at: Utc::now(),
        }
    }
}

// =========================================================================================
// SECTION 5: OBSERVABILITY MODELS
// =========================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineResponse {
    pub online: usize,
    pub rooms: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub room: String,
    pub members: usize,
}
