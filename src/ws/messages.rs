//! WebSocket frame encoding and decoding.
//!
//! Every frame, in both directions, is an adjacently tagged JSON envelope:
//! `{"event": "<name>", "data": {...}}`. Room events use the
//! [`RoomEvent`](crate::domain::RoomEvent) encoding unchanged; errors are
//! sent as `{"event": "error", "data": {"code": ..., "message": ...}}`.

use serde::Serialize;

use crate::domain::{ConnectionEvent, Delivery};
use crate::error::GatewayError;

/// Frames the server sends that are not room events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ControlFrame {
    /// Failure reported to the connection that caused it.
    Error {
        /// Numeric error code, as in [`GatewayError::error_code`].
        code: u32,
        /// Human-readable message.
        message: String,
    },
}

impl ControlFrame {
    /// Builds the error frame for `err`.
    #[must_use]
    pub fn from_error(err: &GatewayError) -> Self {
        Self::Error {
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

/// Parses and validates one inbound text frame.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if the frame is not valid JSON,
/// names an unknown event, is missing fields, or fails validation (empty
/// room, blank name).
pub fn parse_frame(text: &str) -> Result<ConnectionEvent, GatewayError> {
    let event: ConnectionEvent = serde_json::from_str(text)
        .map_err(|e| GatewayError::InvalidRequest(format!("malformed frame: {e}")))?;
    event.validate()?;
    Ok(event)
}

/// Encodes an outbound queue item as a text frame.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if serialization fails.
pub fn encode_delivery(delivery: &Delivery) -> Result<String, GatewayError> {
    let encoded = match delivery {
        Delivery::Event { event, .. } => serde_json::to_string(event.as_ref()),
        Delivery::Error { code, message } => serde_json::to_string(&ControlFrame::Error {
            code: *code,
            message: message.clone(),
        }),
    };
    encoded.map_err(|e| GatewayError::Internal(e.to_string()))
}
