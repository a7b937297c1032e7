//! In-memory storage - used in tests and when no durable backend is configured.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use qms_core::ports::{KeyValueStorage, StorageChange, StorageError};

use super::change_stream;

struct Shared {
    store: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<StorageChange>,
}

/// In-memory key-value storage using a HashMap with async RwLock.
///
/// `handle()` returns another view of the same map with its own identity,
/// so two session stores can observe each other's writes the way two
/// windows of the dashboard do.
/// Note: Data is lost on process restart.
pub struct InMemoryStorage {
    shared: Arc<Shared>,
    origin: Uuid,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                store: RwLock::new(HashMap::new()),
                changes: broadcast::channel(64).0,
            }),
            origin: Uuid::new_v4(),
        }
    }

    /// Another handle on the same data.
    pub fn handle(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            origin: Uuid::new_v4(),
        }
    }

    fn publish(&self, key: &str, value: Option<&str>) {
        // Ignore send errors (no listeners)
        let _ = self.shared.changes.send(StorageChange {
            key: key.to_string(),
            value: value.map(str::to_string),
            origin: self.origin,
        });
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let store = self.shared.store.read().await;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut store = self.shared.store.write().await;
        store.insert(key.to_string(), value.to_string());
        drop(store);

        self.publish(key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut store = self.shared.store.write().await;
        let existed = store.remove(key).is_some();
        drop(store);

        if existed {
            self.publish(key, None);
        }
        Ok(())
    }

    fn changes(&self) -> BoxStream<'static, StorageChange> {
        change_stream(self.shared.changes.subscribe(), self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_set_and_get() {
        let storage = InMemoryStorage::new();
        storage.set("key1", "value1").await.unwrap();
        assert_eq!(storage.get("key1").await.unwrap(), Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_remove() {
        let storage = InMemoryStorage::new();
        storage.set("key1", "value1").await.unwrap();
        storage.remove("key1").await.unwrap();
        assert_eq!(storage.get("key1").await.unwrap(), None);

        // Removing again is fine
        storage.remove("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_handles_see_each_others_changes_but_not_their_own() {
        let first = InMemoryStorage::new();
        let second = first.handle();
        let mut first_changes = first.changes();
        let mut second_changes = second.changes();

        first.set("qms_admin_token", "abc").await.unwrap();

        let change = tokio::time::timeout(Duration::from_secs(1), second_changes.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.key, "qms_admin_token");
        assert_eq!(change.value.as_deref(), Some("abc"));
        assert_eq!(second.get("qms_admin_token").await.unwrap(), Some("abc".to_string()));

        let own = tokio::time::timeout(Duration::from_millis(100), first_changes.next()).await;
        assert!(own.is_err());
    }
}
