use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use futures::FutureExt;
use futures::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use qms_core::ApiError;
use qms_core::domain::{HttpRequest, Tag};
use qms_core::ports::{CredentialProvider, Transport};

use super::entry::{Entry, EntrySnapshot, Listener, SharedFetch};
use super::{CacheKey, MutationEndpoint, QueryEndpoint, QueryStatus};
use crate::error::{decode, normalize};

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry nobody subscribes to is kept.
    pub keep_unused_for: Duration,
    /// Period of the eviction task started by [`QueryCache::spawn_janitor`].
    pub janitor_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            keep_unused_for: Duration::from_secs(60),
            janitor_interval: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            keep_unused_for: std::env::var("QMS_CACHE_KEEP_UNUSED_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.keep_unused_for),
            janitor_interval: std::env::var("QMS_CACHE_JANITOR_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.janitor_interval),
        }
    }
}

/// Per-subscription options.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Go to the network on mount even when a fresh entry exists.
    pub refetch_on_mount: bool,
}

impl QueryOptions {
    pub fn refetch_on_mount() -> Self {
        Self {
            refetch_on_mount: true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Use a fresh entry, join an in-flight request, or start one.
    IfNeeded,
    /// Join an in-flight request or start one, ignoring freshness.
    Refresh,
}

enum Begin {
    Ready(Result<Value, ApiError>),
    Wait(SharedFetch),
}

/// Listener calls collected under the lock and delivered after it is released.
#[derive(Default)]
struct Outbox(Vec<(Vec<Listener>, EntrySnapshot)>);

impl Outbox {
    fn push(&mut self, listeners: Vec<Listener>, snapshot: EntrySnapshot) {
        if !listeners.is_empty() {
            self.0.push((listeners, snapshot));
        }
    }

    fn deliver(self) {
        for (listeners, snapshot) in self.0 {
            for listener in listeners {
                listener(&snapshot);
            }
        }
    }
}

#[derive(Default)]
struct State {
    entries: HashMap<CacheKey, Entry>,
    next_listener: u64,
}

struct Inner {
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    config: CacheConfig,
    state: Mutex<State>,
}

/// Shared query cache with tag invalidation and request de-duplication.
///
/// Cloning is cheap; every clone sees the same entries. The internal lock is
/// never held across an await point, and listeners run after it is released.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Option<Arc<dyn CredentialProvider>>,
        config: CacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                credentials,
                config,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Run a query, answering from the cache when the entry is fresh.
    ///
    /// Concurrent calls with the same arguments share one request.
    pub async fn query<A: Serialize>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
    ) -> Result<Value, ApiError> {
        let key = endpoint.key(args);
        self.fetch(key, || endpoint.request(args), endpoint.provides, FetchMode::IfNeeded)
            .await
    }

    /// [`query`](Self::query), deserialized into `T`.
    pub async fn query_as<A: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
    ) -> Result<T, ApiError> {
        decode(self.query(endpoint, args).await?)
    }

    /// Run a query over the network even if a fresh entry exists.
    pub async fn refetch<A: Serialize>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
    ) -> Result<Value, ApiError> {
        let key = endpoint.key(args);
        self.fetch(key, || endpoint.request(args), endpoint.provides, FetchMode::Refresh)
            .await
    }

    /// Register `listener` for every transition of the entry for `args`.
    ///
    /// The listener is called immediately with the current snapshot. A fetch is
    /// started unless the entry is fresh (or `refetch_on_mount` is set) and no
    /// request is already in flight. Must be called inside a Tokio runtime.
    pub fn subscribe<A: Serialize>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
        options: QueryOptions,
        listener: impl Fn(&EntrySnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let key = endpoint.key(args);
        let listener: Listener = Arc::new(listener);
        let mut outbox = Outbox::default();

        let id = {
            let mut state = self.inner.lock();
            self.inner.prune(&mut state);

            let id = state.next_listener;
            state.next_listener += 1;

            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(endpoint.request(args), endpoint.provides));
            entry.listeners.insert(id, listener.clone());
            entry.unused_since = None;

            let launch = entry.inflight.is_none()
                && (options.refetch_on_mount || !entry.is_fresh());
            if launch {
                let _ = self.inner.launch(&key, entry, None);
                outbox.push(entry.listeners(), entry.snapshot(&key));
            } else {
                outbox.push(vec![listener], entry.snapshot(&key));
            }
            id
        };

        tracing::trace!(key = %key, listener = id, "Subscribed");
        outbox.deliver();

        Subscription {
            cache: Arc::downgrade(&self.inner),
            key,
            id,
            request: endpoint.request(args),
            tags: endpoint.provides,
        }
    }

    /// Run a mutation; on success invalidate its tags and wait for the refetches.
    ///
    /// A failed mutation leaves every entry untouched.
    pub async fn mutate<A>(
        &self,
        endpoint: &MutationEndpoint<A>,
        args: &A,
    ) -> Result<Value, ApiError> {
        let request = endpoint.request(args);
        let value = match self.inner.execute(&request).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    mutation = endpoint.name,
                    request = %request,
                    error = %err,
                    "Mutation failed"
                );
                return Err(err);
            }
        };

        tracing::debug!(mutation = endpoint.name, request = %request, "Mutation succeeded");
        self.invalidate(endpoint.invalidates).await;
        Ok(value)
    }

    /// Mark every entry carrying one of `tags` stale.
    ///
    /// Entries somebody subscribes to are refetched and awaited; the rest are
    /// dropped.
    pub async fn invalidate(&self, tags: &[Tag]) {
        if tags.is_empty() {
            return;
        }

        let mut outbox = Outbox::default();
        let mut dropped = 0usize;
        let refetches: Vec<SharedFetch> = {
            let mut state = self.inner.lock();
            self.inner.prune(&mut state);

            let keys: Vec<CacheKey> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.has_tag(tags))
                .map(|(key, _)| key.clone())
                .collect();

            let mut refetches = Vec::new();
            for key in keys {
                let unused = state
                    .entries
                    .get(&key)
                    .is_some_and(|entry| entry.listeners.is_empty());
                if unused {
                    state.entries.remove(&key);
                    dropped += 1;
                    continue;
                }
                let Some(entry) = state.entries.get_mut(&key) else {
                    continue;
                };
                // Chains behind a request already in flight
                entry.stale = true;
                let previous = entry.inflight.take();
                refetches.push(self.inner.launch(&key, entry, previous));
                outbox.push(entry.listeners(), entry.snapshot(&key));
            }
            refetches
        };

        tracing::debug!(
            tags = ?tags,
            refetched = refetches.len(),
            dropped,
            "Invalidated cache tags"
        );
        outbox.deliver();
        join_all(refetches).await;
    }

    /// Current snapshot of the entry for `args`, if there is one.
    pub fn snapshot<A: Serialize>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
    ) -> Option<EntrySnapshot> {
        self.snapshot_of(&endpoint.key(args))
    }

    pub fn snapshot_of(&self, key: &CacheKey) -> Option<EntrySnapshot> {
        let mut state = self.inner.lock();
        self.inner.prune(&mut state);
        state.entries.get(key).map(|entry| entry.snapshot(key))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut state = self.inner.lock();
        self.inner.prune(&mut state);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict entries that have been unused for longer than `keep_unused_for`.
    pub fn prune(&self) -> usize {
        let mut state = self.inner.lock();
        self.inner.prune(&mut state)
    }

    /// Forget every cached payload.
    ///
    /// Entries nobody subscribes to are removed. Subscribed entries go back to
    /// `Uninitialized` so their views show nothing from the previous session;
    /// results of requests still in flight are discarded.
    pub fn reset(&self) {
        self.clear_entries(false);
    }

    /// [`reset`](Self::reset), then fetch every subscribed entry again.
    ///
    /// Used when a new session starts, so mounted views fill themselves with
    /// the new session's data.
    pub fn reload(&self) {
        self.clear_entries(true);
    }

    fn clear_entries(&self, relaunch: bool) {
        let mut outbox = Outbox::default();
        let mut relaunched = 0usize;
        {
            let mut state = self.inner.lock();
            let before = state.entries.len();
            // Entries with a request on the wire stay so the next launch can wait for it
            state
                .entries
                .retain(|_, entry| !entry.listeners.is_empty() || entry.inflight.is_some());
            for (key, entry) in state.entries.iter_mut() {
                entry.clear();
                if relaunch && !entry.listeners.is_empty() {
                    let _ = self.inner.launch(key, entry, None);
                    relaunched += 1;
                }
                outbox.push(entry.listeners(), entry.snapshot(key));
            }
            tracing::debug!(
                removed = before - state.entries.len(),
                cleared = state.entries.len(),
                relaunched,
                "Cache reset"
            );
        }
        outbox.deliver();
    }

    /// Start a background task pruning idle entries every `janitor_interval`.
    ///
    /// The task ends once every handle to the cache is dropped.
    pub fn spawn_janitor(&self) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.inner);
        let period = self.inner.config.janitor_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = cache.upgrade() else {
                    break;
                };
                let evicted = {
                    let mut state = inner.lock();
                    inner.prune(&mut state)
                };
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted idle cache entries");
                }
            }
        })
    }

    async fn fetch(
        &self,
        key: CacheKey,
        build: impl FnOnce() -> HttpRequest,
        tags: &'static [Tag],
        mode: FetchMode,
    ) -> Result<Value, ApiError> {
        match self.inner.begin(key, build, tags, mode) {
            Begin::Ready(result) => result,
            Begin::Wait(fetch) => fetch.await,
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(
        self: &Arc<Self>,
        key: CacheKey,
        build: impl FnOnce() -> HttpRequest,
        tags: &'static [Tag],
        mode: FetchMode,
    ) -> Begin {
        let mut outbox = Outbox::default();
        let begin = {
            let mut state = self.lock();
            self.prune(&mut state);

            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(build(), tags));

            match (mode, entry.inflight.clone()) {
                (FetchMode::IfNeeded, _) if entry.is_fresh() => {
                    tracing::trace!(key = %key, "Cache hit");
                    Begin::Ready(Ok(entry.data.clone().unwrap_or(Value::Null)))
                }
                (FetchMode::IfNeeded | FetchMode::Refresh, Some(inflight)) => {
                    tracing::trace!(key = %key, "Joined in-flight request");
                    Begin::Wait(inflight)
                }
                _ => {
                    let fetch = self.launch(&key, entry, None);
                    outbox.push(entry.listeners(), entry.snapshot(&key));
                    Begin::Wait(fetch)
                }
            }
        };
        outbox.deliver();
        begin
    }

    /// Start the request for `entry`, after `after` (or a request retired by a
    /// reset) completes.
    ///
    /// The request runs on its own task so it settles the entry even when
    /// every caller stops waiting.
    fn launch(self: &Arc<Self>, key: &CacheKey, entry: &mut Entry, after: Option<SharedFetch>) -> SharedFetch {
        let retired = entry.retired.take();
        let after = after.or(retired);
        entry.generation += 1;
        entry.status = QueryStatus::Pending;

        let generation = entry.generation;
        let request = entry.request.clone();
        let inner = self.clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            if let Some(previous) = after {
                let _ = previous.await;
            }
            let result = inner.execute(&request).await;
            inner.settle(&task_key, generation, &result);
            result
        });

        let fetch = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Network(format!("request task failed: {e}"))))
        }
        .boxed()
        .shared();

        tracing::debug!(key = %key, generation, "Fetching");
        entry.inflight = Some(fetch.clone());
        fetch
    }

    fn settle(&self, key: &CacheKey, generation: u64, result: &Result<Value, ApiError>) {
        let mut outbox = Outbox::default();
        {
            let mut state = self.lock();
            let Some(entry) = state.entries.get_mut(key) else {
                tracing::trace!(key = %key, "Entry evicted before its request settled");
                return;
            };
            if entry.generation != generation {
                return;
            }
            entry.settle(result);
            if let Err(err) = result {
                tracing::warn!(key = %key, error = %err, "Query failed");
            }
            outbox.push(entry.listeners(), entry.snapshot(key));
        }
        outbox.deliver();
    }

    /// Send one request with the current bearer token and normalize the answer.
    async fn execute(&self, request: &HttpRequest) -> Result<Value, ApiError> {
        let bearer = self
            .credentials
            .as_ref()
            .and_then(|provider| provider.bearer_token());

        let result = normalize(self.transport.send(request, bearer.as_deref()).await);

        if let (Err(ApiError::Authentication(_)), Some(token), Some(provider)) =
            (&result, &bearer, &self.credentials)
        {
            tracing::warn!(request = %request, "Token rejected by the server");
            provider.token_rejected(token).await;
        }
        result
    }

    fn prune(&self, state: &mut State) -> usize {
        let keep = self.config.keep_unused_for;
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| {
            let idle = entry.listeners.is_empty() && entry.inflight.is_none();
            !(idle && entry.unused_since.is_some_and(|since| now.duration_since(since) >= keep))
        });
        before - state.entries.len()
    }

    fn unsubscribe(&self, key: &CacheKey, id: u64) {
        let mut state = self.lock();
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        entry.listeners.remove(&id);
        if entry.listeners.is_empty() {
            entry.unused_since = Some(Instant::now());
            if self.config.keep_unused_for.is_zero() && entry.inflight.is_none() {
                state.entries.remove(key);
            }
        }
        tracing::trace!(key = %key, listener = id, "Unsubscribed");
    }
}

/// Handle of one listener registration. Dropping it unsubscribes.
pub struct Subscription {
    cache: Weak<Inner>,
    key: CacheKey,
    id: u64,
    request: HttpRequest,
    tags: &'static [Tag],
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn snapshot(&self) -> Option<EntrySnapshot> {
        let inner = self.cache.upgrade()?;
        let state = inner.lock();
        state.entries.get(&self.key).map(|entry| entry.snapshot(&self.key))
    }

    /// Re-run the query over the network, joining a request already in flight.
    pub async fn refetch(&self) -> Result<Value, ApiError> {
        let Some(inner) = self.cache.upgrade() else {
            return Err(ApiError::Network("query cache is gone".to_string()));
        };
        let request = self.request.clone();
        match inner.begin(self.key.clone(), move || request, self.tags, FetchMode::Refresh) {
            Begin::Ready(result) => result,
            Begin::Wait(fetch) => fetch.await,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.cache.upgrade() {
            inner.unsubscribe(&self.key, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
