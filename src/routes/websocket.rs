// File Path: src/routes/websocket.rs

//! WebSocket transport adapter.
//!
//! Upgrades `/ws/:room`, then translates socket frames into lifecycle events on the
//! connection manager. Outbound text flows through a bounded queue drained by a
//! dedicated writer task, so the manager never touches the socket directly.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::{rooms::validate_room_key, state::AppState},
    models::ApiResult,
};

/// Main entry point for the WebSocket upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    validate_room_key(&room, state.config.max_room_key_len)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, room, state)))
}

/// Handles the WebSocket connection lifecycle and message passing.
async fn handle_socket(socket: WebSocket, room: String, state: AppState) {
    let manager = &state.connection_manager;
    let (ws_sender, mut ws_receiver) = socket.split();

    let (tx, rx) = mpsc::channel(state.config.outbound_buffer);
    let release = CancellationToken::new();
    let writer = tokio::spawn(write_outbound(ws_sender, rx, release.clone(), room.clone()));

    let mut session = manager.on_open(tx, &room, release).await;

    // Receiver loop: Handles messages coming *from* the client
    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                manager.on_message(&session, &text).await;
            }
            Ok(Message::Close(frame)) => {
                info!("Client {} closed connection: {:?}", session.id(), frame);
                break;
            }
            Ok(_) => debug!("Client {} sent non-text frame.", session.id()),
            Err(e) => {
                // A broken stream yields nothing further, so the close follows below.
                manager.on_error(&session, &e);
                break;
            }
        }
    }

    manager.on_close(&mut session);
    debug!("Client {} finished in state {:?}", session.id(), session.state());
    if let Err(e) = writer.await {
        warn!("Writer task for {} ended abnormally: {}", session.id(), e);
    }
}

/// Drains the outbound queue into the socket until released or the socket fails.
async fn write_outbound(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Arc<str>>,
    release: CancellationToken,
    room: String,
) {
    loop {
        tokio::select! {
            _ = release.cancelled() => break,
            queued = rx.recv() => match queued {
                Some(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.to_string())).await {
                        warn!("Could not write to client in room '{}': {}", room, e);
                        break;
                    }
                }
                None => break,
            },
        }
    }

    // Dropping `rx` here turns further sends into SendFailed until the reader closes.
    let _ = ws_sender.close().await;
}
