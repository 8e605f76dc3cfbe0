// src/services/dispatcher.rs

//! # Broadcast Dispatcher
//!
//! Fans a message out to every member of a room. Sends to individual members run
//! concurrently, each bounded by the configured send timeout, and a failing member
//! never prevents delivery to the rest of the room.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tracing::{debug, warn};

use super::{connection::ConnectionId, room_registry::MembershipSet};
use crate::models::BroadcastReport;

#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<dyn MembershipSet>,
    send_timeout: Duration,
}

impl BroadcastDispatcher {
    pub fn new(registry: Arc<dyn MembershipSet>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    /// Sends `message` to the room's current members, skipping `exclude` if given.
    ///
    /// Membership is snapshotted once; connections joining afterwards do not receive
    /// this message. An unknown room yields an empty report.
    pub async fn broadcast(
        &self,
        room: &str,
        message: &str,
        exclude: Option<ConnectionId>,
    ) -> BroadcastReport {
        let recipients: Vec<_> = self
            .registry
            .members_of(room)
            .into_iter()
            .filter(|conn| Some(conn.id()) != exclude)
            .collect();

        if recipients.is_empty() {
            debug!("No recipients in room '{}'", room);
            return BroadcastReport::default();
        }

        let payload: Arc<str> = Arc::from(message);
        let sends = recipients.iter().map(|conn| {
            let payload = Arc::clone(&payload);
            async move { conn.send(payload, self.send_timeout).await }
        });

        let mut report = BroadcastReport {
            recipients: recipients.len(),
            ..BroadcastReport::default()
        };

        for (conn, result) in recipients.iter().zip(join_all(sends).await) {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!("Broadcast to {} in room '{}' failed: {}", conn.id(), room, e);
                }
            }
        }

        debug!(
            room,
            recipients = report.recipients,
            delivered = report.delivered,
            failed = report.failed,
            "broadcast complete"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{connection::Connection, room_registry::RoomRegistry};
    use tokio::sync::mpsc;

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn setup() -> (Arc<RoomRegistry>, BroadcastDispatcher) {
        let registry = Arc::new(RoomRegistry::new());
        let dispatcher = BroadcastDispatcher::new(registry.clone(), TIMEOUT);
        (registry, dispatcher)
    }

    fn join(registry: &RoomRegistry, room: &str) -> (Connection, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(8);
        let conn = Connection::new(room, tx);
        registry.join(room, conn.clone());
        (conn, rx)
    }

    #[tokio::test]
    async fn broadcast_reaches_every_member() {
        let (registry, dispatcher) = setup();
        let (_a, mut rx_a) = join(&registry, "r1");
        let (_b, mut rx_b) = join(&registry, "r1");
        let (_c, mut rx_c) = join(&registry, "r2");

        let report = dispatcher.broadcast("r1", "hello", None).await;

        assert_eq!(report, BroadcastReport { recipients: 2, delivered: 2, failed: 0 });
        assert_eq!(&*rx_a.try_recv().unwrap(), "hello");
        assert_eq!(&*rx_b.try_recv().unwrap(), "hello");
        assert!(rx_c.try_recv().is_err());
    }

    #[tokio::test]
    async fn failed_member_does_not_block_others() {
        let (registry, dispatcher) = setup();
        let (_a, mut rx_a) = join(&registry, "r1");
        let (b, rx_b) = join(&registry, "r1");
        let (_c, mut rx_c) = join(&registry, "r1");
        drop(rx_b);

        let report = dispatcher.broadcast("r1", "hello", None).await;

        assert_eq!(report, BroadcastReport { recipients: 3, delivered: 2, failed: 1 });
        assert_eq!(&*rx_a.try_recv().unwrap(), "hello");
        assert_eq!(&*rx_c.try_recv().unwrap(), "hello");
        // A failed send does not evict the member.
        assert!(registry.members_of("r1").contains(&b));
    }

    #[tokio::test]
    async fn stalled_member_is_bounded_by_timeout() {
        let (registry, dispatcher) = setup();
        let (tx, _stalled_rx) = mpsc::channel(1);
        let stalled = Connection::new("r1", tx);
        stalled.send(Arc::from("backlog"), TIMEOUT).await.unwrap();
        registry.join("r1", stalled);
        let (_a, mut rx_a) = join(&registry, "r1");

        let report = dispatcher.broadcast("r1", "hello", None).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(&*rx_a.try_recv().unwrap(), "hello");
    }

    #[tokio::test]
    async fn excluded_connection_is_skipped() {
        let (registry, dispatcher) = setup();
        let (a, mut rx_a) = join(&registry, "r1");
        let (_b, mut rx_b) = join(&registry, "r1");

        let report = dispatcher.broadcast("r1", "hello", Some(a.id())).await;

        assert_eq!(report.recipients, 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(&*rx_b.try_recv().unwrap(), "hello");
    }

    #[tokio::test]
    async fn unknown_room_is_a_noop() {
        let (_registry, dispatcher) = setup();
        let report = dispatcher.broadcast("nowhere", "hello", None).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
