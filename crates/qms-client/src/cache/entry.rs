use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};

use super::CacheKey;
use crate::error::decode;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Known to the cache but never requested, or cleared by a reset.
    Uninitialized,
    Pending,
    Success,
    Error,
}

/// Point-in-time copy of an entry, handed to listeners and callers.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub key: CacheKey,
    pub status: QueryStatus,
    /// Last successful payload. Kept while a refetch is pending or after it fails.
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub is_stale: bool,
}

impl EntrySnapshot {
    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// The payload deserialized as `T`, if there is one.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, ApiError>> {
        self.data.clone().map(decode)
    }
}

pub(crate) type Listener = Arc<dyn Fn(&EntrySnapshot) + Send + Sync>;

pub(crate) type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

pub(crate) struct Entry {
    /// Request that fills this entry, reused by refetches.
    pub request: HttpRequest,
    pub tags: &'static [Tag],
    pub status: QueryStatus,
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub stale: bool,
    /// Bumped by every launch; only the latest launch may settle the entry.
    pub generation: u64,
    pub inflight: Option<SharedFetch>,
    /// Request abandoned by a reset that may still be running. The next
    /// launch waits for it so one key never has two requests on the wire.
    pub retired: Option<SharedFetch>,
    pub listeners: BTreeMap<u64, Listener>,
    /// Set while nobody is subscribed.
    pub unused_since: Option<Instant>,
}

impl Entry {
    pub fn new(request: HttpRequest, tags: &'static [Tag]) -> Self {
        Self {
            request,
            tags,
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            fulfilled_at: None,
            stale: false,
            generation: 0,
            inflight: None,
            retired: None,
            listeners: BTreeMap::new(),
            unused_since: Some(Instant::now()),
        }
    }

    pub fn snapshot(&self, key: &CacheKey) -> EntrySnapshot {
        EntrySnapshot {
            key: key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            fulfilled_at: self.fulfilled_at,
            is_stale: self.stale,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.status == QueryStatus::Success && !self.stale
    }

    pub fn has_tag(&self, tags: &[Tag]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }

    pub fn listeners(&self) -> Vec<Listener> {
        self.listeners.values().cloned().collect()
    }

    pub fn settle(&mut self, result: &Result<Value, ApiError>) {
        match result {
            Ok(value) => {
                self.status = QueryStatus::Success;
                self.data = Some(value.clone());
                self.error = None;
                self.fulfilled_at = Some(Utc::now());
            }
            Err(err) => {
                self.status = QueryStatus::Error;
                self.error = Some(err.clone());
            }
        }
        self.stale = false;
        self.inflight = None;
    }

    pub fn clear(&mut self) {
        self.status = QueryStatus::Uninitialized;
        self.data = None;
        self.error = None;
        self.fulfilled_at = None;
        self.stale = false;
        if let Some(fetch) = self.inflight.take() {
            self.retired = Some(fetch);
        }
        self.generation += 1;
    }
}
