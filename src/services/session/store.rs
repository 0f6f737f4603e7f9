use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use redis::cmd;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::core::redis::RedisHandle;

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("state store unavailable")]
    Unavailable,
    #[error("state store backend error: {0}")]
    Backend(String),
}

/// Narrow key-value interface the session runtime persists through.
///
/// The runtime depends only on this trait, never on a concrete backend, so
/// the whole session lifecycle is testable against `MemoryStore`.
#[async_trait]
pub(crate) trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Atomic get-and-remove. The caller that receives `Some` owns the value.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Returns true when the key was absent and has now been claimed.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.write().await.remove(key))
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(true)
    }
}

/// Redis-backed store for deployments where session state must survive a
/// process restart. Unlike the rate limiter this is not permissive: losing
/// the backend mid-exam is a hard error surfaced to the caller.
pub(crate) struct RedisStore {
    handle: RedisHandle,
}

impl RedisStore {
    pub(crate) fn new(handle: RedisHandle) -> Self {
        Self { handle }
    }

    async fn connection(&self) -> Result<redis::aio::ConnectionManager, StoreError> {
        self.handle.connection().await.ok_or(StoreError::Unavailable)
    }
}

#[async_trait]
impl StateStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        cmd("GETDEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        cmd("SETNX")
            .arg(key)
            .arg(value)
            .query_async::<_, i64>(&mut conn)
            .await
            .map(|claimed| claimed == 1)
            .map_err(|err| StoreError::Backend(err.to_string()))
    }
}

pub(crate) type SharedStore = Arc<dyn StateStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("1".to_string()));

        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some("2".to_string()));

        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_take_yields_value_once() {
        let store = MemoryStore::new();
        store.set("k", "v").await.unwrap();

        assert_eq!(store.take("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.take("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_set_if_absent_claims_once() {
        let store = MemoryStore::new();
        assert!(store.set_if_absent("lease", "s1").await.unwrap());
        assert!(!store.set_if_absent("lease", "s2").await.unwrap());
        assert_eq!(store.get("lease").await.unwrap(), Some("s1".to_string()));
    }
}
