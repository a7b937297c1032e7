//! Console state - the wired data layer and its background tasks.

use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;

use qms_client::AdminClient;
use qms_core::ports::KeyValueStorage;
use qms_infra::{FileStorage, InMemoryStorage, ReqwestTransport, TracingNotifier};

#[cfg(feature = "redis")]
use qms_infra::RedisStorage;

use crate::config::{AppConfig, StorageBackend};

pub struct AppState {
    pub client: AdminClient,
    janitor: JoinHandle<()>,
    storage_watch: JoinHandle<()>,
}

impl AppState {
    /// Build the client with the configured transport and storage and start
    /// cache eviction and cross-process session tracking.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let transport =
            Arc::new(ReqwestTransport::new(config.http.clone()).context("building HTTP transport")?);

        let storage: Arc<dyn KeyValueStorage> = match &config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory session storage; the session ends with the process");
                Arc::new(InMemoryStorage::new())
            }
            StorageBackend::File(path) => {
                tracing::info!(path = %path, "Using file session storage");
                Arc::new(FileStorage::new(path))
            }
            #[cfg(feature = "redis")]
            StorageBackend::Redis(redis) => {
                tracing::info!(url = %redis.url, "Using Redis session storage");
                Arc::new(
                    RedisStorage::new(redis.clone())
                        .await
                        .context("connecting to Redis")?,
                )
            }
        };

        let client = AdminClient::new(
            transport,
            storage,
            Arc::new(TracingNotifier),
            config.cache.clone(),
        );
        let janitor = client.cache().spawn_janitor();
        let storage_watch = client.session().watch_storage();

        tracing::info!(base_url = %config.http.base_url, "Console state initialized");

        Ok(Self {
            client,
            janitor,
            storage_watch,
        })
    }

    /// Stop the background tasks.
    pub fn shutdown(self) {
        self.janitor.abort();
        self.storage_watch.abort();
    }
}
