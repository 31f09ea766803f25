//! WebSocket layer: connection handling and frame encoding.
//!
//! The WebSocket endpoint at `/ws` carries every room interaction: clients
//! send `join`, `leave`, `vote`, `reveal_votes` and `reset_votes` frames and
//! receive the room events of the room they joined.

pub mod connection;
pub mod handler;
pub mod messages;
