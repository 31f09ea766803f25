//! Type-safe connection identifier.
//!
//! [`ConnectionId`] is a newtype wrapper around [`uuid::Uuid`] (v4) minted
//! once per accepted WebSocket. It is distinct from the display name a user
//! picks, which is not unique.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one live transport connection.
///
/// Used as the key of a room's `users` map, of the
/// [`super::ConnectionRegistry`], and of broadcast group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `ConnectionId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for ConnectionId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let uuid = uuid::Uuid::new_v4();
        let id = ConnectionId::from_uuid(uuid);
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn usable_as_json_map_key() {
        let mut map = indexmap::IndexMap::new();
        let id = ConnectionId::new();
        map.insert(id, "Alice".to_string());
        let Ok(json) = serde_json::to_string(&map) else {
            panic!("serialization failed");
        };
        let Ok(back) = serde_json::from_str::<indexmap::IndexMap<ConnectionId, String>>(&json)
        else {
            panic!("deserialization failed");
        };
        assert_eq!(back.get(&id).map(String::as_str), Some("Alice"));
    }
}
