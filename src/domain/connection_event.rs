//! Inbound events arriving from a connection.

use serde::Deserialize;

use super::RoomId;
use super::room_state::deserialize_vote;
use crate::error::GatewayError;

/// Event received from one connection, as named on the wire.
///
/// Frames are adjacently tagged, e.g.
/// `{"event": "vote", "data": {"room": "abc", "vote": "5"}}`.
/// [`ConnectionEvent::Disconnect`] never arrives as a frame; the transport
/// raises it when the socket closes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ConnectionEvent {
    /// Join `room` under the display name `name`.
    Join {
        /// Target room.
        room: RoomId,
        /// Display name chosen by the user.
        name: String,
    },

    /// Leave `room`.
    Leave {
        /// Target room.
        room: RoomId,
    },

    /// Cast or replace this connection's vote in `room`.
    Vote {
        /// Target room.
        room: RoomId,
        /// Vote value; a JSON number is kept as its text.
        #[serde(deserialize_with = "deserialize_vote")]
        vote: String,
    },

    /// Reveal every vote in `room`.
    RevealVotes {
        /// Target room.
        room: RoomId,
    },

    /// Clear every vote in `room`.
    ResetVotes {
        /// Target room.
        room: RoomId,
    },

    /// The connection went away.
    #[serde(skip)]
    Disconnect,
}

impl ConnectionEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Vote { .. } => "vote",
            Self::RevealVotes { .. } => "reveal_votes",
            Self::ResetVotes { .. } => "reset_votes",
            Self::Disconnect => "disconnect",
        }
    }

    /// Returns the room the event targets, if it names one.
    #[must_use]
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Self::Join { room, .. }
            | Self::Leave { room }
            | Self::Vote { room, .. }
            | Self::RevealVotes { room }
            | Self::ResetVotes { room } => Some(room),
            Self::Disconnect => None,
        }
    }

    /// Boundary checks applied before the event reaches the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty room id or an
    /// empty (or whitespace-only) display name on join.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.room().is_some_and(RoomId::is_empty) {
            return Err(GatewayError::InvalidRequest("room is required".to_string()));
        }
        if let Self::Join { name, .. } = self
            && name.trim().is_empty()
        {
            return Err(GatewayError::InvalidRequest("name is required".to_string()));
        }
        Ok(())
    }
}
