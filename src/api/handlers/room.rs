//! Read-only room handlers: list and get.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    PaginationParams, RoomDetailResponse, RoomListResponse, RoomSummaryDto,
};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /rooms` — List stored rooms with pagination.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] if the store cannot be scanned.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns a paginated list of every stored room, ordered by id, with user and vote counts.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated room list", body = RoomListResponse),
        (status = 503, description = "Room store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let rooms = state.coordinator.store().scan_all().await?;
    let summaries = rooms
        .iter()
        .map(|(room_id, room)| RoomSummaryDto::new(room_id.clone(), room))
        .collect();
    let (data, pagination) = params.paginate(summaries);

    Ok(Json(RoomListResponse { data, pagination }))
}

/// `GET /rooms/{id}` — Get room details.
///
/// # Errors
///
/// Returns [`GatewayError::UnknownRoom`] if the room was never created.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    summary = "Get room details",
    description = "Returns the participants of a room in join order and whether each has voted. Vote values stay hidden until revealed over the WebSocket.",
    params(
        ("id" = String, Path, description = "Room identifier"),
    ),
    responses(
        (status = 200, description = "Room details", body = RoomDetailResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 503, description = "Room store unavailable", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let room_id = RoomId::new(id);
    let store = state.coordinator.store();
    if !store.exists(&room_id).await? {
        return Err(GatewayError::UnknownRoom(room_id));
    }
    let room = store
        .get(&room_id)
        .await?
        .ok_or_else(|| GatewayError::UnknownRoom(room_id.clone()))?;

    Ok(Json(RoomDetailResponse::new(room_id, &room)))
}

/// Room routes (mounted under `/api/v1`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms))
        .route("/rooms/{id}", get(get_room))
}
