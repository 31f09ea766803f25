//! Typed room access over a [`KeyValueStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::KeyValueStore;
use crate::domain::{RoomId, RoomState};
use crate::error::GatewayError;

/// Reads and writes [`RoomState`] entries, one per room.
///
/// Keys are `"{key_prefix}{room_id}"`. Every store call is bounded by
/// `timeout`; an expired call fails with [`GatewayError::StoreUnavailable`].
#[derive(Debug, Clone)]
pub struct RoomStore {
    kv: Arc<dyn KeyValueStore>,
    key_prefix: String,
    timeout: Duration,
}

impl RoomStore {
    /// Creates a room store over `kv`.
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kv,
            key_prefix: key_prefix.into(),
            timeout,
        }
    }

    /// Returns the backend name of the underlying store.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.kv.backend()
    }

    /// Loads the state of `room_id`, or `None` if the room was never created.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure or
    /// timeout, and [`GatewayError::CorruptState`] if the entry cannot be
    /// decoded.
    pub async fn get(&self, room_id: &RoomId) -> Result<Option<RoomState>, GatewayError> {
        let key = self.key(room_id);
        let raw = self.bounded("get", self.kv.get(&key)).await?;
        raw.map(|raw| RoomState::decode(room_id, &raw)).transpose()
    }

    /// Replaces the state of `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure or
    /// timeout.
    pub async fn set(&self, room_id: &RoomId, state: &RoomState) -> Result<(), GatewayError> {
        let key = self.key(room_id);
        let raw = state.encode()?;
        self.bounded("set", self.kv.set(&key, raw)).await
    }

    /// Returns `true` if `room_id` has a stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure or
    /// timeout.
    pub async fn exists(&self, room_id: &RoomId) -> Result<bool, GatewayError> {
        let key = self.key(room_id);
        self.bounded("exists", self.kv.exists(&key)).await
    }

    /// Returns every stored room with its state, ordered by room id.
    ///
    /// Entries that vanish between the scan and the read are skipped, as
    /// are entries that fail to decode (logged at `warn`).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] on store failure or
    /// timeout.
    pub async fn scan_all(&self) -> Result<Vec<(RoomId, RoomState)>, GatewayError> {
        let keys = self
            .bounded("scan", self.kv.scan_prefix(&self.key_prefix))
            .await?;
        let mut rooms = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(id) = key.strip_prefix(&self.key_prefix) else {
                continue;
            };
            let room_id = RoomId::new(id);
            match self.get(&room_id).await {
                Ok(Some(state)) => rooms.push((room_id, state)),
                Ok(None) => {}
                Err(GatewayError::CorruptState { room_id, reason }) => {
                    tracing::warn!(%room_id, %reason, "skipping undecodable room entry");
                }
                Err(e) => return Err(e),
            }
        }
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(rooms)
    }

    fn key(&self, room_id: &RoomId) -> String {
        format!("{}{}", self.key_prefix, room_id)
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis(), "room store timed out");
                Err(GatewayError::StoreUnavailable(format!(
                    "{op} timed out after {} ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}
