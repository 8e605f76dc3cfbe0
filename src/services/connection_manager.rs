// src/services/connection_manager.rs

//! # Connection Manager Service
//!
//! Drives each connection through `Opening -> Open -> Closed`, keeping the room
//! registry and the online counter in step, and exposes the server-side push API.

use std::{fmt::Display, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{
    connection::{Connection, ConnectionId, Outbound},
    dispatcher::BroadcastDispatcher,
    online_counter::OnlineCounter,
    room_registry::MembershipSet,
};
use crate::{config::RelayConfig, models::BroadcastReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Opening,
    Open,
    Closed,
}

/// Per-connection lifecycle record, owned by the transport task serving that connection.
#[derive(Debug)]
pub struct Session {
    connection: Connection,
    state: ConnectionState,
    release: CancellationToken,
}

impl Session {
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn room(&self) -> &str {
        self.connection.room()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }
}

/// The central structure for managing connection lifecycles and room broadcasts.
#[derive(Clone)]
pub struct ConnectionManager {
    registry: Arc<dyn MembershipSet>,
    counter: Arc<OnlineCounter>,
    dispatcher: BroadcastDispatcher,
    greeting: Arc<str>,
    echo_to_sender: bool,
    send_timeout: Duration,
}

impl ConnectionManager {
    /// Creates a manager over the given registry and counter.
    ///
    /// # Arguments
    /// * `registry` - Membership set shared with anything else that needs room lookups.
    /// * `counter` - Process-wide online counter.
    /// * `config` - Supplies the greeting, sender echo policy and send timeout.
    pub fn new(
        registry: Arc<dyn MembershipSet>,
        counter: Arc<OnlineCounter>,
        config: &RelayConfig,
    ) -> Self {
        let send_timeout = config.send_timeout();
        Self {
            dispatcher: BroadcastDispatcher::new(Arc::clone(&registry), send_timeout),
            registry,
            counter,
            greeting: Arc::from(config.greeting.as_str()),
            echo_to_sender: config.echo_to_sender,
            send_timeout,
        }
    }

    /// Open-event: joins `room`, counts the connection and greets it.
    ///
    /// A failed greeting is logged; the connection stays a full member regardless.
    /// `release` is cancelled when the connection closes.
    pub async fn on_open(&self, tx: Outbound, room: &str, release: CancellationToken) -> Session {
        let mut session = Session {
            connection: Connection::new(room, tx),
            state: ConnectionState::Opening,
            release,
        };

        self.registry.join(room, session.connection.clone());
        let online = self.counter.increment();
        session.state = ConnectionState::Open;
        info!(
            "Connection {} joined room '{}'; online: {}",
            session.id(),
            room,
            online
        );

        if let Err(e) = session
            .connection
            .send(Arc::clone(&self.greeting), self.send_timeout)
            .await
        {
            warn!("Greeting to {} failed: {}", session.id(), e);
        }

        session
    }

    /// Message-event: relays `text` to the sender's room.
    ///
    /// The sender receives its own message unless `echo_to_sender` is disabled.
    pub async fn on_message(&self, session: &Session, text: &str) -> BroadcastReport {
        if session.state != ConnectionState::Open {
            debug!("Ignoring message from {} in state {:?}", session.id(), session.state);
            return BroadcastReport::default();
        }

        debug!("Message from {} in room '{}': {}", session.id(), session.room(), text);
        let exclude = (!self.echo_to_sender).then(|| session.id());
        self.dispatcher.broadcast(session.room(), text, exclude).await
    }

    /// Error-event: logged only. Closing is left to a separate close-event.
    pub fn on_error(&self, session: &Session, cause: &dyn Display) {
        warn!(
            "Connection {} in room '{}' reported an error: {}",
            session.id(),
            session.room(),
            cause
        );
    }

    /// Close-event: leaves the room, uncounts the connection and runs the release hook.
    ///
    /// Safe to call repeatedly; only the first call has any effect.
    pub fn on_close(&self, session: &mut Session) {
        if session.state == ConnectionState::Closed {
            debug!("Connection {} already closed", session.id());
            return;
        }

        if self.registry.leave(session.room(), session.id()) {
            // Underflow is logged by the counter itself.
            let _ = self.counter.decrement();
        }
        session.release.cancel();
        session.state = ConnectionState::Closed;

        info!(
            "Connection {} left room '{}'; online: {}",
            session.id(),
            session.room(),
            self.counter.get()
        );
    }

    /// Server-initiated push to every member of `room`. Unknown rooms are a no-op.
    pub async fn push_to_room(&self, room: &str, message: &str) -> BroadcastReport {
        info!("Pushing to room '{}'", room);
        self.dispatcher.broadcast(room, message, None).await
    }

    pub fn online_count(&self) -> usize {
        self.counter.get()
    }

    pub fn room_count(&self) -> usize {
        self.registry.room_count()
    }

    pub fn member_count(&self, room: &str) -> usize {
        self.registry.members_of(room).len()
    }
}
