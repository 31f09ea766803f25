//! Store layer: the shared key-value store and typed room access on top.
//!
//! [`KeyValueStore`] is the narrow contract the gateway needs from whatever
//! holds room state (get/set/exists/prefix scan over string keys).
//! [`RoomStore`] adds room encoding, key namespacing and a bounded timeout.

pub mod memory;
pub mod redis_store;
pub mod room_store;

use async_trait::async_trait;

use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use room_store::RoomStore;

/// Minimal key-value contract for the shared room store.
///
/// Implementations report connectivity problems as
/// [`GatewayError::StoreUnavailable`].
#[async_trait]
pub trait KeyValueStore: std::fmt::Debug + Send + Sync {
    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be
    /// reached.
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be
    /// reached.
    async fn set(&self, key: &str, value: String) -> Result<(), GatewayError>;

    /// Returns `true` if `key` holds a value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be
    /// reached.
    async fn exists(&self, key: &str) -> Result<bool, GatewayError>;

    /// Returns every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be
    /// reached.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, GatewayError>;

    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;
}
