//! In-process key-value store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::error::GatewayError;

/// [`KeyValueStore`] kept in process memory.
///
/// Suitable for a single gateway instance and for tests. Keys are ordered,
/// so prefix scans return them sorted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GatewayError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), GatewayError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, GatewayError> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, GatewayError> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_exists() {
        let store = MemoryStore::new();
        assert!(matches!(store.exists("k").await, Ok(false)));
        assert!(store.set("k", "v".to_string()).await.is_ok());
        assert!(matches!(store.exists("k").await, Ok(true)));
        let Ok(value) = store.get("k").await else {
            panic!("get failed");
        };
        assert_eq!(value.as_deref(), Some("v"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("nope").await, Ok(None)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn scan_prefix_only_returns_matching_keys() {
        let store = MemoryStore::new();
        for key in ["room:b", "room:a", "session:x", "roomz"] {
            let _ = store.set(key, String::new()).await;
        }
        let Ok(keys) = store.scan_prefix("room:").await else {
            panic!("scan failed");
        };
        assert_eq!(keys, vec!["room:a", "room:b"]);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = MemoryStore::new();
        tokio_test::block_on(async {
            tokio_test::assert_ok!(store.set("k", "1".to_string()).await);
            tokio_test::assert_ok!(store.set("k", "2".to_string()).await);
            let value = tokio_test::assert_ok!(store.get("k").await);
            assert_eq!(value.as_deref(), Some("2"));
            assert_eq!(store.len().await, 1);
        });
    }
}
