//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection: inbound
//! frames go to the [`SessionCoordinator`], queued deliveries go out to the
//! socket, and closing the socket raises
//! [`ConnectionEvent::Disconnect`].

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::{ControlFrame, encode_delivery, parse_frame};
use crate::domain::{ConnectionEvent, ConnectionId, Delivery};
use crate::service::SessionCoordinator;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads event frames from the client and hands them to the coordinator.
/// - Forwards everything queued for this connection to the client.
pub async fn run_connection(socket: WebSocket, coordinator: Arc<SessionCoordinator>) {
    let conn_id = ConnectionId::new();
    let mut outbox = coordinator.gateway().register(conn_id).await;
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::debug!(%conn_id, "ws connection opened");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_text_message(&coordinator, conn_id, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(%conn_id, error = %e, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            delivery = outbox.recv() => {
                let Some(delivery) = delivery else {
                    break;
                };
                match encode_delivery(&delivery) {
                    Ok(json) => {
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(%conn_id, error = %e, "failed to encode frame"),
                }
            }
        }
    }

    if let Err(e) = coordinator.handle(conn_id, ConnectionEvent::Disconnect).await {
        tracing::warn!(%conn_id, error = %e, "disconnect cleanup failed");
    }
    tracing::debug!(%conn_id, "ws connection closed");
}

/// Handles one text frame from the client.
///
/// Failures that concern the client (bad frame, store outage) are queued
/// back to this connection as an error frame; nothing is broadcast.
async fn handle_text_message(coordinator: &SessionCoordinator, conn_id: ConnectionId, text: &str) {
    let result = match parse_frame(text) {
        Ok(event) => {
            tracing::debug!(%conn_id, event = event.event_type_str(), "ws event");
            coordinator.handle(conn_id, event).await
        }
        Err(e) => Err(e),
    };
    let Err(err) = result else {
        return;
    };

    if err.is_transient() {
        tracing::warn!(%conn_id, error = %err, "event failed, store unavailable");
    } else {
        tracing::debug!(%conn_id, error = %err, "event rejected");
    }
    let ControlFrame::Error { code, message } = ControlFrame::from_error(&err);
    let queued = coordinator
        .gateway()
        .send_to(conn_id, Delivery::Error { code, message })
        .await;
    if !queued {
        tracing::debug!(%conn_id, "error frame dropped");
    }
}
