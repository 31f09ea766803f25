//! Per-room mutual exclusion for read-modify-write against the room store.
//!
//! The store offers plain get/set, so two events for the same room could
//! otherwise interleave and the later `set` would drop the earlier change.
//! [`RoomLocks`] hands out one async mutex per room; holding its guard
//! across get, apply, set and broadcast puts all events of a room in a total
//! order while different rooms proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::RoomId;

/// Proof that the caller holds the lock for [`RoomGuard::room_id`].
#[derive(Debug)]
pub struct RoomGuard {
    room_id: RoomId,
    _guard: OwnedMutexGuard<()>,
}

impl RoomGuard {
    /// Room this guard serializes.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }
}

/// Lazily populated table of per-room locks.
///
/// # Concurrency
///
/// - The outer map lock is held only to find or insert an entry.
/// - Waiting for a room never blocks callers of another room.
/// - Entries are dropped by [`RoomLocks::prune`] once nobody holds or
///   awaits them.
#[derive(Debug, Default)]
pub struct RoomLocks {
    locks: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `room_id`.
    pub async fn lock(&self, room_id: &RoomId) -> RoomGuard {
        let entry = {
            let mut map = self.locks.lock().await;
            Arc::clone(map.entry(room_id.clone()).or_default())
        };
        RoomGuard {
            room_id: room_id.clone(),
            _guard: entry.lock_owned().await,
        }
    }

    /// Drops the lock entry for `room_id` if no task holds or awaits it.
    ///
    /// Returns `true` if the entry was removed.
    pub async fn prune(&self, room_id: &RoomId) -> bool {
        let mut map = self.locks.lock().await;
        if map
            .get(room_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            map.remove(room_id);
            return true;
        }
        false
    }

    /// Returns the number of rooms with a live lock entry.
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Returns `true` if no lock entry exists.
    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}
