//! Room DTOs for the read-only room endpoints.
//!
//! Vote values never leave the gateway through these types; only whether
//! a participant has voted.

use serde::Serialize;
use utoipa::ToSchema;

use super::PaginationMeta;
use crate::domain::{RoomId, RoomState};

/// Room entry in a list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummaryDto {
    /// Room identifier.
    #[schema(value_type = String)]
    pub room_id: RoomId,
    /// Number of connections currently in the room.
    pub user_count: usize,
    /// Number of recorded votes.
    pub vote_count: usize,
}

impl RoomSummaryDto {
    /// Summarizes `state` for `room_id`.
    #[must_use]
    pub fn new(room_id: RoomId, state: &RoomState) -> Self {
        Self {
            room_id,
            user_count: state.users.len(),
            vote_count: state.votes.len(),
        }
    }
}

/// Paginated room list response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Rooms on this page, ordered by id.
    pub data: Vec<RoomSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// One participant as shown in a room detail response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParticipantDto {
    /// Display name.
    pub name: String,
    /// Whether a vote is recorded under this name.
    pub has_voted: bool,
}

/// Room detail response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomDetailResponse {
    /// Room identifier.
    #[schema(value_type = String)]
    pub room_id: RoomId,
    /// Participants in join order.
    pub participants: Vec<ParticipantDto>,
    /// Number of recorded votes, including ones from users who left.
    pub vote_count: usize,
    /// `true` when nobody is in the room.
    pub dormant: bool,
}

impl RoomDetailResponse {
    /// Builds the detail view of `state` for `room_id`.
    #[must_use]
    pub fn new(room_id: RoomId, state: &RoomState) -> Self {
        let participants = state
            .users
            .values()
            .map(|name| ParticipantDto {
                name: name.clone(),
                has_voted: state.votes.contains_key(name),
            })
            .collect();
        Self {
            room_id,
            participants,
            vote_count: state.votes.len(),
            dormant: state.is_dormant(),
        }
    }
}
