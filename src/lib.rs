//! # estimate-gateway
//!
//! Real-time room state synchronization for planning-poker sessions.
//!
//! Participants join a named room over a WebSocket, cast opaque vote
//! strings, and any participant can reveal all votes (with the average of
//! the numeric ones) or reset them. Every change is broadcast to everyone
//! in the room. Room state lives in a key-value store (in-process or
//! Redis) so several gateway processes can share it.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler (ws/)            REST Handlers (api/)
//!     │
//!     ├── SessionCoordinator (service/)
//!     │     lock room → get → apply → set → emit → unlock
//!     │
//!     ├── RoomStateMachine, RoomLocks (domain/)
//!     ├── ConnectionRegistry, BroadcastGateway (domain/)
//!     │
//!     └── RoomStore (store/) over MemoryStore | RedisStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
pub mod ws;
