// src/services/redis_service.rs

//! # Redis Push Bridge
//!
//! Subscribes to a Redis Pub/Sub channel and turns each `{"room", "message"}` payload
//! into a push to that room. Runs until aborted, reconnecting after failures.

use std::time::Duration;

use futures::StreamExt;
use tracing::{error, info, instrument, warn};

use super::connection_manager::ConnectionManager;
use crate::models::RoomPush;

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Starts the subscription loop. Never returns under normal operation.
#[instrument(skip(manager))]
pub async fn start_redis_listener(manager: ConnectionManager, redis_url: String, channel: String) {
    info!("Starting Redis push bridge, attempting connection to: {}", redis_url);

    // Use an infinite loop to handle reconnections if the connection fails
    loop {
        match try_connect_and_subscribe(&redis_url, &channel, &manager).await {
            Ok(()) => info!("Redis subscription stopped. Restarting..."),
            Err(e) => {
                error!(
                    "Redis connection or subscription failed: {}. Retrying in {:?}...",
                    e, RETRY_DELAY
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

/// Connects to Redis, subscribes to the channel, and runs the message consumption loop.
async fn try_connect_and_subscribe(
    url: &str,
    channel: &str,
    manager: &ConnectionManager,
) -> Result<(), redis::RedisError> {
    let client = redis::Client::open(url)?;
    let conn = client.get_tokio_connection().await?;

    let mut pubsub = conn.into_pubsub();
    pubsub.subscribe(channel).await?;
    info!("Successfully subscribed to Redis channel: {}", channel);

    let mut message_stream = pubsub.on_message();
    while let Some(msg) = message_stream.next().await {
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to get payload from Redis message: {}", e);
                continue;
            }
        };

        match decode_push(&payload) {
            Some(push) => {
                manager.push_to_room(&push.room, &push.message).await;
            }
            None => warn!("Skipping undecodable push payload: {}", payload),
        }
    }

    // Stream terminated normally (connection closed)
    Ok(())
}

fn decode_push(payload: &str) -> Option<RoomPush> {
    serde_json::from_str::<RoomPush>(payload)
        .ok()
        .filter(|push| !push.room.is_empty())
}
