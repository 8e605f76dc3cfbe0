// src/services/connection.rs

//! # Connection Handle
//!
//! A lightweight value describing one live client session: a unique id, the room it
//! joined at open time, and the sending half of its outbound queue. The socket itself
//! is owned by a writer task in the transport adapter; this handle only enqueues text.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::{self, error::SendTimeoutError};
use uuid::Uuid;

use crate::models::{RelayError, RelayResult};

/// Unique identity of a connection. Two connections in the same room are distinct members.
pub type ConnectionId = Uuid;

/// Sending half of a connection's outbound queue.
pub type Outbound = mpsc::Sender<Arc<str>>;

#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    room: Arc<str>,
    tx: Outbound,
}

impl Connection {
    /// Creates a handle with a fresh id. The room key is fixed for the handle's lifetime.
    pub fn new(room: &str, tx: Outbound) -> Self {
        Self {
            id: Uuid::new_v4(),
            room: Arc::from(room),
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Queues `text` for the writer task, waiting at most `timeout` for queue space.
    ///
    /// Fails when the writer task has gone away or the queue stayed full.
    pub async fn send(&self, text: Arc<str>, timeout: Duration) -> RelayResult<()> {
        match self.tx.send_timeout(text, timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(_)) => Err(RelayError::SendTimeout {
                connection: self.id,
                timeout,
            }),
            Err(SendTimeoutError::Closed(_)) => Err(RelayError::SendFailed {
                connection: self.id,
                reason: "outbound queue closed".to_string(),
            }),
        }
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
