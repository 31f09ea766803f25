//! Domain layer: room identity, room state, transitions and fan-out.
//!
//! This module holds the pure room state machine together with the shared
//! in-process structures the session coordinator drives: the connection
//! registry, the broadcast gateway and the per-room lock table.

pub mod broadcast_gateway;
pub mod connection_event;
pub mod connection_id;
pub mod connection_registry;
pub mod room_event;
pub mod room_id;
pub mod room_locks;
pub mod room_state;
pub mod state_machine;

pub use broadcast_gateway::{BroadcastGateway, Delivery};
pub use connection_event::ConnectionEvent;
pub use connection_id::ConnectionId;
pub use connection_registry::{ConnectionBinding, ConnectionRegistry};
pub use room_event::RoomEvent;
pub use room_id::RoomId;
pub use room_locks::{RoomGuard, RoomLocks};
pub use room_state::RoomState;
pub use state_machine::{RoomCommand, Transition};
