//! Outbound events broadcast to a room's subscribers.
//!
//! Every accepted state transition yields one or more [`RoomEvent`]s. They
//! serialize adjacently tagged, `{"event": "<name>", "data": {...}}`, with
//! the event names clients already listen for.

use indexmap::IndexMap;
use serde::Serialize;

/// Event delivered to every connection subscribed to a room.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A connection joined the room.
    UserJoined {
        /// Display name the connection joined with.
        name: String,
    },

    /// A connection left the room or disconnected.
    UserLeft {
        /// Display name the connection had joined with.
        name: String,
    },

    /// Full list of display names currently in the room, in join order.
    #[serde(rename = "update_users")]
    UsersUpdated {
        /// Display names; duplicates appear once per connection.
        users: Vec<String>,
    },

    /// A user cast or changed a vote.
    VoteUpdate {
        /// Voter's display name.
        name: String,
        /// The vote value as submitted.
        vote: String,
    },

    /// Votes were revealed.
    VotesRevealed {
        /// Every current vote keyed by display name.
        votes: IndexMap<String, String>,
        /// Mean of the numeric votes rounded to two decimals, 0 if none.
        average: f64,
    },

    /// All votes were cleared.
    VotesReset {},
}

impl RoomEvent {
    /// Returns the wire name of the event.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::UsersUpdated { .. } => "update_users",
            Self::VoteUpdate { .. } => "vote_update",
            Self::VotesRevealed { .. } => "votes_revealed",
            Self::VotesReset {} => "votes_reset",
        }
    }
}
