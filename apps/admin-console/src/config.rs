//! Console configuration loaded from environment variables.

use std::env;

use qms_client::CacheConfig;
use qms_core::domain::Credentials;
use qms_infra::HttpConfig;
use qms_shared::ListParams;

#[cfg(feature = "redis")]
use qms_infra::RedisConfig;

/// Where the session token and identity are persisted.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    /// Lost when the process exits.
    Memory,
    /// JSON file on local disk.
    File(String),
    /// Shared with every console on the same Redis.
    #[cfg(feature = "redis")]
    Redis(RedisConfig),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub storage: StorageBackend,
    /// Used when no persisted session can be restored.
    pub credentials: Option<Credentials>,
    pub users: ListParams,
    /// Keep running after the first fetch, following session changes until Ctrl-C.
    pub follow: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let credentials = match (env::var("QMS_ADMIN_EMAIL"), env::var("QMS_ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(Credentials::new(email, password)),
            _ => None,
        };

        let page = env::var("QMS_USERS_PAGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let per_page = env::var("QMS_USERS_PER_PAGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(25);
        let mut users = ListParams::page(page, per_page);
        if let Ok(search) = env::var("QMS_USERS_SEARCH") {
            users = users.with_search(search);
        }

        Self {
            http: HttpConfig::from_env(),
            cache: CacheConfig::from_env(),
            storage: Self::parse_storage(),
            credentials,
            users,
            follow: env::var("QMS_FOLLOW")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// QMS_STORAGE=memory|file|redis, defaulting to file.
    fn parse_storage() -> StorageBackend {
        match env::var("QMS_STORAGE")
            .unwrap_or_else(|_| "file".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            #[cfg(feature = "redis")]
            "redis" => StorageBackend::Redis(RedisConfig::from_env()),
            other => {
                if other != "file" {
                    tracing::warn!(backend = %other, "Unknown storage backend, using file storage");
                }
                StorageBackend::File(
                    env::var("QMS_STORAGE_PATH").unwrap_or_else(|_| ".qms-session.json".to_string()),
                )
            }
        }
    }
}
