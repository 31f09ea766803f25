//! Redis-backed key-value store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::KeyValueStore;
use crate::error::GatewayError;

/// [`KeyValueStore`] on a shared Redis instance.
///
/// Holds one multiplexed connection opened at startup; clones of it share
/// the underlying socket.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Opens a connection to the Redis server at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the URL is invalid or
    /// the server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, GatewayError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError> {
        let mut conn = self.conn.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), GatewayError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, GatewayError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists::<_, bool>(key).await?)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, GatewayError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut iter = conn.scan_match::<_, String>(pattern).await?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

/// Escapes Redis glob metacharacters so `prefix` matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prefix_is_unchanged() {
        assert_eq!(escape_glob("room:"), "room:");
    }

    #[test]
    fn glob_characters_are_escaped() {
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let result = RedisStore::connect("not a url").await;
        assert!(matches!(result, Err(GatewayError::StoreUnavailable(_))));
    }
}
