//! Live connection to room binding.
//!
//! [`ConnectionRegistry`] answers "which room was this connection in?" when
//! a socket closes without telling us, so a disconnect touches exactly one
//! room instead of scanning the store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{ConnectionId, RoomId};

/// Room and display name a connection joined with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBinding {
    /// Room the connection is in.
    pub room_id: RoomId,
    /// Display name used in that room.
    pub name: String,
}

/// Index of live connections keyed by [`ConnectionId`].
///
/// A connection is bound to at most one room. Each entry is written only
/// by its own connection's join (create) and leave/disconnect (destroy).
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    bindings: RwLock<HashMap<ConnectionId, ConnectionBinding>>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn_id` to `room_id` under `name`, returning the previous
    /// binding if there was one.
    pub async fn bind(
        &self,
        conn_id: ConnectionId,
        room_id: RoomId,
        name: String,
    ) -> Option<ConnectionBinding> {
        self.bindings
            .write()
            .await
            .insert(conn_id, ConnectionBinding { room_id, name })
    }

    /// Removes the binding for `conn_id`, returning it.
    pub async fn unbind(&self, conn_id: ConnectionId) -> Option<ConnectionBinding> {
        self.bindings.write().await.remove(&conn_id)
    }

    /// Removes the binding for `conn_id` only if it points at `room_id`.
    pub async fn unbind_from(&self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        let mut map = self.bindings.write().await;
        if map.get(&conn_id).is_some_and(|b| &b.room_id == room_id) {
            map.remove(&conn_id);
            return true;
        }
        false
    }

    /// Returns the binding for `conn_id`, if any.
    pub async fn lookup(&self, conn_id: ConnectionId) -> Option<ConnectionBinding> {
        self.bindings.read().await.get(&conn_id).cloned()
    }

    /// Returns the number of bound connections.
    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// Returns `true` if no connection is bound.
    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }
}
