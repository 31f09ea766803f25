//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use crate::api::dto::{
    PaginationMeta, ParticipantDto, RoomDetailResponse, RoomListResponse, RoomSummaryDto,
};
use crate::api::handlers::{room, system};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "estimate-gateway",
        description = "Read-only REST views over planning-poker rooms. Room interaction happens over the `/ws` WebSocket."
    ),
    paths(system::health_handler, room::list_rooms, room::get_room),
    components(schemas(
        system::HealthResponse,
        RoomListResponse,
        RoomSummaryDto,
        RoomDetailResponse,
        ParticipantDto,
        PaginationMeta,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Service status"),
        (name = "Rooms", description = "Room inspection"),
    )
)]
pub struct ApiDoc;
