//! Key/value storage backends for session state.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tower_sessions::cookie::Cookie;

/// Errors from a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The tower-sessions backend failed.
    #[error("session backend error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// A value could not be encoded or decoded.
    #[error("session value error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Per-browser key/value storage plus a place to put response cookies.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read a value.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Queue a cookie for the browser. Removal cookies expire the named cookie.
    async fn set_cookie(&self, cookie: Cookie<'static>);
}

/// Storage held entirely in memory. Used by tests and by tools that run the
/// session logic outside a request.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
    cookies: RwLock<HashMap<String, Cookie<'static>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last cookie set under `name`, including removal cookies.
    pub async fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies.read().await.get(name).cloned()
    }

    /// Number of stored items.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn set_cookie(&self, cookie: Cookie<'static>) {
        self.cookies
            .write()
            .await
            .insert(cookie.name().to_string(), cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_items() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty().await);

        storage
            .set_item("a", "1".to_string())
            .await
            .expect("set");
        assert_eq!(storage.get_item("a").await.expect("get"), Some("1".to_string()));

        storage.remove_item("a").await.expect("remove");
        storage.remove_item("missing").await.expect("remove missing");
        assert_eq!(storage.get_item("a").await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_memory_storage_cookies_replace_by_name() {
        let storage = MemoryStorage::new();
        storage.set_cookie(Cookie::new("dso_token", "one")).await;
        storage.set_cookie(Cookie::new("dso_token", "two")).await;
        let cookie = storage.cookie("dso_token").await.expect("cookie");
        assert_eq!(cookie.value(), "two");
    }
}
