//! Durable key-value storage port - where the session survives restarts.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A write observed on shared storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
    /// New value, `None` when the key was removed.
    pub value: Option<String>,
    /// Handle that performed the write.
    pub origin: Uuid,
}

/// Storage trait - abstraction over durable backends (file, Redis, in-memory).
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Get a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Set a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Changes made through other handles on the same backing store.
    ///
    /// Writes made through this handle are not reported back to it.
    fn changes(&self) -> BoxStream<'static, StorageChange>;
}

/// Storage operation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("I/O failed: {0}")]
    Io(String),
}
