//! Data Transfer Objects for REST response serialization.

pub mod common_dto;
pub mod room_dto;

pub use common_dto::*;
pub use room_dto::*;
