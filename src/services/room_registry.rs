// src/services/room_registry.rs

//! # Room Registry
//!
//! Tracks which connections are currently joined to which room. Membership is stored
//! in a sharded concurrent map keyed by room, so joins and leaves on different rooms
//! rarely contend and every operation on a single room is serialized by its shard lock.

use std::collections::HashMap;

use dashmap::DashMap;

use super::connection::{Connection, ConnectionId};

/// A concurrent room-keyed membership set.
///
/// Implementations must keep `members_of` consistent with completed `join`/`leave`
/// calls on the same room: a fully joined connection is always visible and a fully
/// departed one never is.
pub trait MembershipSet: Send + Sync {
    /// Inserts `connection` into `room`, creating the room if absent.
    fn join(&self, room: &str, connection: Connection);

    /// Removes the connection from `room`, dropping the room once it is empty.
    /// Returns `false` (and does nothing) if the connection was not a member.
    fn leave(&self, room: &str, id: ConnectionId) -> bool;

    /// Snapshot of the room's current members; empty for an unknown room.
    fn members_of(&self, room: &str) -> Vec<Connection>;

    /// Number of rooms with at least one member.
    fn room_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashMap<ConnectionId, Connection>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MembershipSet for RoomRegistry {
    fn join(&self, room: &str, connection: Connection) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection.id(), connection);
    }

    fn leave(&self, room: &str, id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => members.remove(&id).is_some(),
            None => false,
        };

        // The shard guard above is released; re-check emptiness under the lock so a
        // concurrent join between the two steps keeps the room alive.
        self.rooms.remove_if(room, |_, members| members.is_empty());

        removed
    }

    fn members_of(&self, room: &str) -> Vec<Connection> {
        self.rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};
    use tokio::sync::mpsc;

    fn connection(room: &str) -> Connection {
        let (tx, _rx) = mpsc::channel(1);
        Connection::new(room, tx)
    }

    fn ids(members: &[Connection]) -> Vec<ConnectionId> {
        let mut ids: Vec<_> = members.iter().map(Connection::id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn join_creates_room_and_adds_member() {
        let registry = RoomRegistry::new();
        let a = connection("r1");
        let b = connection("r1");

        registry.join("r1", a.clone());
        registry.join("r1", b.clone());

        let mut expected = vec![a.id(), b.id()];
        expected.sort();
        assert_eq!(ids(&registry.members_of("r1")), expected);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let a = connection("r1");
        let b = connection("r2");
        registry.join("r1", a.clone());
        registry.join("r2", b.clone());

        assert_eq!(ids(&registry.members_of("r1")), vec![a.id()]);
        assert_eq!(ids(&registry.members_of("r2")), vec![b.id()]);
    }

    #[test]
    fn leave_drops_empty_room() {
        let registry = RoomRegistry::new();
        let a = connection("r1");
        registry.join("r1", a.clone());

        assert!(registry.leave("r1", a.id()));
        assert!(registry.members_of("r1").is_empty());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn leave_twice_is_a_noop() {
        let registry = RoomRegistry::new();
        let a = connection("r1");
        let b = connection("r1");
        registry.join("r1", a.clone());
        registry.join("r1", b.clone());

        assert!(registry.leave("r1", a.id()));
        assert!(!registry.leave("r1", a.id()));
        assert_eq!(ids(&registry.members_of("r1")), vec![b.id()]);
    }

    #[test]
    fn leave_unknown_room_is_a_noop() {
        let registry = RoomRegistry::new();
        assert!(!registry.leave("nowhere", connection("nowhere").id()));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn members_of_unknown_room_is_empty() {
        let registry = RoomRegistry::new();
        assert!(registry.members_of("nowhere").is_empty());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_changes() {
        let registry = RoomRegistry::new();
        let a = connection("r1");
        registry.join("r1", a.clone());

        let snapshot = registry.members_of("r1");
        registry.leave("r1", a.id());
        registry.join("r1", connection("r1"));

        assert_eq!(ids(&snapshot), vec![a.id()]);
    }

    #[test]
    fn concurrent_joins_to_same_room_all_land() {
        let registry = Arc::new(RoomRegistry::new());

        thread::scope(|scope| {
            for _ in 0..16 {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    for _ in 0..50 {
                        registry.join("busy", connection("busy"));
                    }
                });
            }
        });

        assert_eq!(registry.members_of("busy").len(), 16 * 50);
    }

    #[test]
    fn concurrent_join_and_leave_keeps_survivors() {
        let registry = Arc::new(RoomRegistry::new());
        let leavers: Vec<_> = (0..200).map(|_| connection("mixed")).collect();
        for conn in &leavers {
            registry.join("mixed", conn.clone());
        }
        let stayers: Vec<_> = (0..200).map(|_| connection("mixed")).collect();

        thread::scope(|scope| {
            for chunk in leavers.chunks(50) {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    for conn in chunk {
                        registry.leave("mixed", conn.id());
                    }
                });
            }
            for chunk in stayers.chunks(50) {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    for conn in chunk {
                        registry.join("mixed", conn.clone());
                    }
                });
            }
        });

        let mut expected: Vec<_> = stayers.iter().map(Connection::id).collect();
        expected.sort();
        assert_eq!(ids(&registry.members_of("mixed")), expected);
    }
}
