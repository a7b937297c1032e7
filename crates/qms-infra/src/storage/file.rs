//! File-backed storage - a JSON object on disk, the durable default.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use qms_core::ports::{KeyValueStorage, StorageChange, StorageError};

use super::change_stream;

struct Shared {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
    changes: broadcast::Sender<StorageChange>,
}

/// Storage persisted as a flat JSON object of string values.
///
/// Writes go to a temporary file that is renamed over the original, so a
/// crash never leaves a half-written file behind. Change notifications are
/// delivered between handles of this process only.
pub struct FileStorage {
    shared: Arc<Shared>,
    origin: Uuid,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            shared: Arc::new(Shared {
                path: path.into(),
                lock: Mutex::new(()),
                changes: broadcast::channel(64).0,
            }),
            origin: Uuid::new_v4(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("QMS_STORAGE_PATH").unwrap_or_else(|_| ".qms-session.json".to_string()),
        )
    }

    /// Another handle on the same file.
    pub fn handle(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            origin: Uuid::new_v4(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read(&self.shared.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }

        serde_json::from_slice(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_vec_pretty(values)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp = self.shared.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.shared.path)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))
    }

    fn publish(&self, key: &str, value: Option<&str>) {
        let _ = self.shared.changes.send(StorageChange {
            key: key.to_string(),
            value: value.map(str::to_string),
            origin: self.origin,
        });
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.shared.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.shared.lock.lock().await;

        // A corrupt file is replaced rather than blocking every future write
        let mut values = match self.load().await {
            Ok(values) => values,
            Err(StorageError::Serialization(e)) => {
                tracing::warn!(path = %self.shared.path.display(), error = %e, "Discarding corrupt storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());
        self.save(&values).await?;

        self.publish(key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.shared.lock.lock().await;

        let mut values = match self.load().await {
            Ok(values) => values,
            Err(StorageError::Serialization(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        if values.remove(key).is_some() {
            self.save(&values).await?;
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

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileStorage::new(&path);
        storage.set("qms_admin_token", "abc").await.unwrap();
        storage.set("qms_admin_user", r#"{"email":"a@b.c"}"#).await.unwrap();
        drop(storage);

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("qms_admin_token").await.unwrap(), Some("abc".to_string()));
        assert_eq!(
            reopened.get("qms_admin_user").await.unwrap(),
            Some(r#"{"email":"a@b.c"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));

        assert_eq!(storage.get("anything").await.unwrap(), None);
        storage.remove("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_then_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("qms_admin_token").await,
            Err(StorageError::Serialization(_))
        ));

        storage.set("qms_admin_token", "fresh").await.unwrap();
        assert_eq!(storage.get("qms_admin_token").await.unwrap(), Some("fresh".to_string()));
    }
}
