//! Service layer: event orchestration.
//!
//! [`SessionCoordinator`] applies connection events to room state through
//! the pure state machine, persists the result and broadcasts the derived
//! room events.

pub mod session_coordinator;

pub use session_coordinator::SessionCoordinator;
