//! Room-scoped fan-out of outbound events.
//!
//! Each connection registers a bounded outbound queue. Rooms are broadcast
//! groups: [`BroadcastGateway::emit`] pushes an event into the queue of
//! every connection subscribed to the room at that instant.
//!
//! A connection whose queue is full is evicted: its queue is closed and its
//! memberships dropped, so its transport drains what was already queued,
//! then shuts down and goes through disconnect cleanup. Every connection
//! that stays subscribed receives every event emitted to its room.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use super::{ConnectionId, RoomEvent, RoomId};

/// Item placed in a connection's outbound queue.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// Event broadcast to a room the connection is subscribed to.
    Event {
        /// Room the event belongs to.
        room_id: RoomId,
        /// Shared event payload.
        event: Arc<RoomEvent>,
    },
    /// Error reported to this connection only.
    Error {
        /// Numeric error code.
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

#[derive(Debug, Default)]
struct Groups {
    outboxes: HashMap<ConnectionId, mpsc::Sender<Delivery>>,
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl Groups {
    fn leave(&mut self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        let removed = self
            .members
            .get_mut(room_id)
            .is_some_and(|set| set.remove(&conn_id));
        if self.members.get(room_id).is_some_and(HashSet::is_empty) {
            self.members.remove(room_id);
        }
        if let Some(rooms) = self.memberships.get_mut(&conn_id) {
            rooms.remove(room_id);
        }
        removed
    }

    fn remove_connection(&mut self, conn_id: ConnectionId) {
        self.outboxes.remove(&conn_id);
        let rooms = self.memberships.remove(&conn_id).unwrap_or_default();
        for room_id in &rooms {
            self.leave(conn_id, room_id);
        }
    }
}

/// Delivers [`RoomEvent`]s to the connections subscribed to a room.
///
/// A closed queue drops the item for that connection only; a full queue
/// evicts the connection (see the module docs).
#[derive(Debug)]
pub struct BroadcastGateway {
    groups: RwLock<Groups>,
    queue_capacity: usize,
}

impl BroadcastGateway {
    /// Creates a gateway whose per-connection queues hold `queue_capacity`
    /// items.
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            groups: RwLock::new(Groups::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Opens the outbound queue for `conn_id`.
    ///
    /// The transport drains the returned receiver into the socket. A second
    /// registration replaces the first queue.
    pub async fn register(&self, conn_id: ConnectionId) -> mpsc::Receiver<Delivery> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let mut groups = self.groups.write().await;
        groups.outboxes.insert(conn_id, tx);
        groups.memberships.entry(conn_id).or_default();
        rx
    }

    /// Drops the queue of `conn_id` and every group membership it held.
    pub async fn deregister(&self, conn_id: ConnectionId) {
        self.groups.write().await.remove_connection(conn_id);
    }

    /// Adds `conn_id` to the broadcast group of `room_id`.
    ///
    /// Returns `false` if it was already a member.
    pub async fn subscribe(&self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        let mut groups = self.groups.write().await;
        groups
            .memberships
            .entry(conn_id)
            .or_default()
            .insert(room_id.clone());
        groups
            .members
            .entry(room_id.clone())
            .or_default()
            .insert(conn_id)
    }

    /// Removes `conn_id` from the broadcast group of `room_id`.
    ///
    /// Returns `false` if it was not a member.
    pub async fn unsubscribe(&self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        self.groups.write().await.leave(conn_id, room_id)
    }

    /// Sends `event` to every current member of `room_id`.
    ///
    /// Returns the number of queues that accepted the event. Members whose
    /// queue is full are evicted.
    pub async fn emit(&self, room_id: &RoomId, event: RoomEvent) -> usize {
        let event = Arc::new(event);
        let mut lagging = Vec::new();
        let mut delivered = 0;
        {
            let groups = self.groups.read().await;
            let Some(members) = groups.members.get(room_id) else {
                return 0;
            };
            for conn_id in members {
                let Some(outbox) = groups.outboxes.get(conn_id) else {
                    continue;
                };
                let delivery = Delivery::Event {
                    room_id: room_id.clone(),
                    event: Arc::clone(&event),
                };
                match outbox.try_send(delivery) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(%conn_id, %room_id, event = event.event_type_str(), "outbound queue full, closing connection");
                        lagging.push(*conn_id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(%conn_id, %room_id, "outbound queue closed");
                    }
                }
            }
        }
        if !lagging.is_empty() {
            let mut groups = self.groups.write().await;
            for conn_id in lagging {
                groups.remove_connection(conn_id);
            }
        }
        delivered
    }

    /// Sends `delivery` to `conn_id` alone. Returns `true` if it was queued.
    pub async fn send_to(&self, conn_id: ConnectionId, delivery: Delivery) -> bool {
        let groups = self.groups.read().await;
        groups
            .outboxes
            .get(&conn_id)
            .is_some_and(|outbox| outbox.try_send(delivery).is_ok())
    }

    /// Returns the number of connections subscribed to `room_id`.
    pub async fn group_size(&self, room_id: &RoomId) -> usize {
        self.groups
            .read()
            .await
            .members
            .get(room_id)
            .map_or(0, HashSet::len)
    }

    /// Returns the number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.groups.read().await.outboxes.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn joined(name: &str) -> RoomEvent {
        RoomEvent::UserJoined {
            name: name.to_string(),
        }
    }

    fn expect_event(delivery: Option<Delivery>) -> (RoomId, Arc<RoomEvent>) {
        match delivery {
            Some(Delivery::Event { room_id, event }) => (room_id, event),
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn emit_without_members_returns_zero() {
        let gateway = BroadcastGateway::new(8);
        assert_eq!(gateway.emit(&RoomId::new("r"), joined("Ann")).await, 0);
    }

    #[tokio::test]
    async fn subscribers_receive_room_events() {
        let gateway = BroadcastGateway::new(8);
        let room = RoomId::new("r1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let mut rx_a = gateway.register(a).await;
        let mut rx_b = gateway.register(b).await;
        gateway.subscribe(a, &room).await;
        gateway.subscribe(b, &room).await;

        assert_eq!(gateway.emit(&room, joined("Ann")).await, 2);

        let (room_a, event_a) = expect_event(rx_a.recv().await);
        let (_, event_b) = expect_event(rx_b.recv().await);
        assert_eq!(room_a, room);
        assert_eq!(*event_a, joined("Ann"));
        assert_eq!(event_a, event_b);
    }

    #[tokio::test]
    async fn events_stay_in_their_room() {
        let gateway = BroadcastGateway::new(8);
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _rx_a = gateway.register(a).await;
        let mut rx_b = gateway.register(b).await;
        gateway.subscribe(a, &RoomId::new("x")).await;
        gateway.subscribe(b, &RoomId::new("y")).await;

        assert_eq!(gateway.emit(&RoomId::new("x"), joined("Ann")).await, 1);
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let gateway = BroadcastGateway::new(8);
        let room = RoomId::new("r1");
        let a = ConnectionId::new();
        let mut rx = gateway.register(a).await;
        assert!(gateway.subscribe(a, &room).await);
        assert!(!gateway.subscribe(a, &room).await);
        assert!(gateway.unsubscribe(a, &room).await);
        assert!(!gateway.unsubscribe(a, &room).await);

        assert_eq!(gateway.emit(&room, joined("Ann")).await, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(gateway.group_size(&room).await, 0);
    }

    #[tokio::test]
    async fn deregister_clears_memberships() {
        let gateway = BroadcastGateway::new(8);
        let a = ConnectionId::new();
        let _rx = gateway.register(a).await;
        gateway.subscribe(a, &RoomId::new("x")).await;
        gateway.subscribe(a, &RoomId::new("y")).await;

        gateway.deregister(a).await;
        assert_eq!(gateway.group_size(&RoomId::new("x")).await, 0);
        assert_eq!(gateway.group_size(&RoomId::new("y")).await, 0);
        assert_eq!(gateway.connection_count().await, 0);
    }

    #[tokio::test]
    async fn full_queue_closes_only_that_connection() {
        let gateway = BroadcastGateway::new(1);
        let room = RoomId::new("r1");
        let (slow, fast) = (ConnectionId::new(), ConnectionId::new());
        let mut rx_slow = gateway.register(slow).await;
        let mut rx_fast = gateway.register(fast).await;
        gateway.subscribe(slow, &room).await;
        gateway.subscribe(fast, &room).await;

        assert_eq!(gateway.emit(&room, joined("one")).await, 2);
        let _ = rx_fast.recv().await;
        assert_eq!(gateway.emit(&room, joined("two")).await, 1);

        // The slow reader gets what was queued, then sees its queue close.
        let (_, first) = expect_event(rx_slow.recv().await);
        assert_eq!(*first, joined("one"));
        assert!(rx_slow.recv().await.is_none());

        assert_eq!(gateway.group_size(&room).await, 1);
        assert_eq!(gateway.connection_count().await, 1);
        let (_, second) = expect_event(rx_fast.recv().await);
        assert_eq!(*second, joined("two"));
        assert_eq!(gateway.emit(&room, joined("three")).await, 1);
    }

    #[tokio::test]
    async fn send_to_reaches_one_connection() {
        let gateway = BroadcastGateway::new(4);
        let a = ConnectionId::new();
        let mut rx = gateway.register(a).await;
        let sent = gateway
            .send_to(
                a,
                Delivery::Error {
                    code: 3001,
                    message: "store down".to_string(),
                },
            )
            .await;
        assert!(sent);
        assert!(matches!(rx.recv().await, Some(Delivery::Error { code: 3001, .. })));
        assert!(!gateway.send_to(ConnectionId::new(), Delivery::Error { code: 1, message: String::new() }).await);
    }
}
