//! Per-room membership and vote state as held in the room store.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use super::{ConnectionId, RoomId};
use crate::error::GatewayError;

/// Stored state of one room.
///
/// Serialized as `{"users": {conn_id: name}, "votes": {name: vote}}`.
/// Both maps keep insertion order, so the encoding is deterministic and
/// `update_users` lists names in join order.
///
/// `users` is keyed by the text form of a connection id. Entries written by
/// other processes may use any opaque string as the key; they decode fine
/// and simply never match a connection of this process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    /// Live connections in the room and the display name each joined with.
    #[serde(default)]
    pub users: IndexMap<String, String>,

    /// Current vote per display name. Values are opaque strings.
    #[serde(default, deserialize_with = "deserialize_votes")]
    pub votes: IndexMap<String, String>,
}

impl RoomState {
    /// Creates an empty room.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the display name bound to `conn_id`, if it is in the room.
    #[must_use]
    pub fn name_of(&self, conn_id: &ConnectionId) -> Option<&str> {
        self.users.get(&conn_id.to_string()).map(String::as_str)
    }

    /// Binds `conn_id` to `name`, returning the name it had before.
    ///
    /// A connection already in the room keeps its join position.
    pub fn insert_user(&mut self, conn_id: &ConnectionId, name: impl Into<String>) -> Option<String> {
        self.users.insert(conn_id.to_string(), name.into())
    }

    /// Removes `conn_id`, returning the name it joined with.
    ///
    /// The remaining users keep their join order.
    pub fn remove_user(&mut self, conn_id: &ConnectionId) -> Option<String> {
        self.users.shift_remove(&conn_id.to_string())
    }

    /// Returns the display names of all users, in join order.
    #[must_use]
    pub fn user_names(&self) -> Vec<String> {
        self.users.values().cloned().collect()
    }

    /// Returns `true` when no connection is in the room.
    #[must_use]
    pub fn is_dormant(&self) -> bool {
        self.users.is_empty()
    }

    /// Encodes the state for the room store.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if serialization fails.
    pub fn encode(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Internal(e.to_string()))
    }

    /// Decodes a stored entry for `room_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::CorruptState`] if the entry is not a valid
    /// room encoding.
    pub fn decode(room_id: &RoomId, raw: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(raw).map_err(|e| GatewayError::CorruptState {
            room_id: room_id.clone(),
            reason: e.to_string(),
        })
    }
}

/// A vote as it may appear on the wire or in older store entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVote {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawVote> for String {
    fn from(raw: RawVote) -> Self {
        match raw {
            RawVote::Text(text) => text,
            RawVote::Number(number) => number.to_string(),
        }
    }
}

/// Deserializes a single vote value, accepting a JSON string or number.
///
/// Numbers are kept in their textual form, so `5` and `"5"` are the same
/// vote.
///
/// # Errors
///
/// Fails for any JSON type other than string or number.
pub fn deserialize_vote<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawVote::deserialize(deserializer).map(String::from)
}

fn deserialize_votes<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, RawVote>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(name, vote)| (name, vote.into())).collect())
}
