//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Every failure
//! is scoped to the single event or request being processed; none of them is
//! fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ConnectionId, RoomId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "unknown room: 3f1c",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request             |
/// | 2000–2999 | State/Not Found | 404 Not Found               |
/// | 3000–3999 | Server / Store  | 500 / 503                   |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The room store could not be reached within the configured timeout.
    ///
    /// Transient: the event changed nothing and broadcast nothing, so the
    /// caller may retry it as a whole.
    #[error("room store unavailable: {0}")]
    StoreUnavailable(String),

    /// No state exists for the room at event time.
    #[error("unknown room: {0}")]
    UnknownRoom(RoomId),

    /// The connection has no identity in the targeted room.
    #[error("unresolved connection: {0}")]
    UnresolvedConnection(ConnectionId),

    /// Inbound frame or request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A stored room entry could not be decoded.
    #[error("corrupt state for room {room_id}: {reason}")]
    CorruptState {
        /// Room whose entry failed to decode.
        room_id: RoomId,
        /// Decoder error message.
        reason: String,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownRoom(_) => 2001,
            Self::UnresolvedConnection(_) => 2002,
            Self::Internal(_) => 3000,
            Self::StoreUnavailable(_) => 3001,
            Self::CorruptState { .. } => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnknownRoom(_) | Self::UnresolvedConnection(_) => StatusCode::NOT_FOUND,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::CorruptState { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns `true` for outcomes that end an event as a quiet no-op.
    ///
    /// A vote from an unjoined connection, or any non-join event against a
    /// room with no stored state, changes nothing and is never reported to
    /// the end user.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::UnknownRoom(_) | Self::UnresolvedConnection(_))
    }

    /// Returns `true` if retrying the same event may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<redis::RedisError> for GatewayError {
    fn from(err: redis::RedisError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_variants() {
        assert!(GatewayError::UnknownRoom(RoomId::new("r")).is_silent());
        assert!(GatewayError::UnresolvedConnection(ConnectionId::new()).is_silent());
        assert!(!GatewayError::StoreUnavailable("down".to_string()).is_silent());
        assert!(!GatewayError::InvalidRequest("x".to_string()).is_silent());
    }

    #[test]
    fn store_unavailable_is_transient_503() {
        let err = GatewayError::StoreUnavailable("timed out".to_string());
        assert!(err.is_transient());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), 3001);
    }

    #[test]
    fn unknown_room_maps_to_404() {
        let err = GatewayError::UnknownRoom(RoomId::new("abc"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "unknown room: abc");
    }

    #[test]
    fn into_response_sets_status() {
        let response = GatewayError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
