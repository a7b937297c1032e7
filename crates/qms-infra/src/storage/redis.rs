//! Redis storage implementation - session shared between processes.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

use qms_core::ports::{KeyValueStorage, StorageChange, StorageError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix applied to every key and to the change channel
    pub namespace: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            namespace: "qms".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            namespace: std::env::var("REDIS_NAMESPACE").unwrap_or_else(|_| "qms".to_string()),
        }
    }
}

/// Redis-backed storage.
///
/// Every write is followed by a publish on `<namespace>:storage-changes`, so
/// every process holding a session on the same Redis sees logins and logouts
/// made elsewhere.
pub struct RedisStorage {
    conn: ConnectionManager,
    client: Client,
    config: RedisConfig,
    origin: Uuid,
}

impl RedisStorage {
    pub async fn new(config: RedisConfig) -> Result<Self, StorageError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client.clone());
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| StorageError::Connection("Connection timed out".to_string()))?
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis session storage");

        Ok(Self {
            conn,
            client,
            config,
            origin: Uuid::new_v4(),
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, StorageError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }

    fn channel(&self) -> String {
        format!("{}:storage-changes", self.config.namespace)
    }

    async fn publish(&self, key: &str, value: Option<&str>) {
        let change = StorageChange {
            key: key.to_string(),
            value: value.map(str::to_string),
            origin: self.origin,
        };
        let payload = match serde_json::to_string(&change) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode storage change");
                return;
            }
        };

        let mut conn = self.conn.clone();
        if let Err(e) = conn.publish::<_, _, ()>(self.channel(), payload).await {
            tracing::warn!(key = %key, error = %e, "Redis PUBLISH failed");
        }
    }
}

#[async_trait]
impl KeyValueStorage for RedisStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(self.key(key))
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.key(key), value)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        self.publish(key, Some(value)).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.conn.clone();
        let removed: u32 = conn
            .del(self.key(key))
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if removed > 0 {
            self.publish(key, None).await;
        }
        Ok(())
    }

    fn changes(&self) -> BoxStream<'static, StorageChange> {
        let client = self.client.clone();
        let channel = self.channel();
        let origin = self.origin;

        let messages = async move {
            let mut pubsub = match client.get_async_pubsub().await {
                Ok(pubsub) => pubsub,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to get pubsub connection");
                    return stream::empty::<redis::Msg>().boxed();
                }
            };
            if let Err(e) = pubsub.subscribe(&channel).await {
                tracing::error!(channel = %channel, error = %e, "Failed to subscribe");
                return stream::empty::<redis::Msg>().boxed();
            }
            tracing::debug!(channel = %channel, "Subscribed to storage changes");
            pubsub.into_on_message().boxed()
        };

        stream::once(messages)
            .flatten()
            .filter_map(move |msg| async move {
                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to get message payload");
                        return None;
                    }
                };
                match serde_json::from_str::<StorageChange>(&payload) {
                    Ok(change) if change.origin != origin => Some(change),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring malformed storage change");
                        None
                    }
                }
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get_test_storage() -> Option<RedisStorage> {
        let config = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            namespace: format!("qms-test-{}", Uuid::new_v4()),
        };

        RedisStorage::new(config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_storage_set_get_remove() {
        let storage = match get_test_storage().await {
            Some(s) => s,
            None => {
                tracing::warn!("Redis not available, skipping test");
                return;
            }
        };

        storage.set("qms_admin_token", "abc").await.unwrap();
        assert_eq!(storage.get("qms_admin_token").await.unwrap(), Some("abc".to_string()));

        storage.remove("qms_admin_token").await.unwrap();
        assert_eq!(storage.get("qms_admin_token").await.unwrap(), None);
    }
}
