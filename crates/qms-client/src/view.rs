//! Data-bound views.
//!
//! A view turns cache transitions into a renderable [`ViewState`] published
//! on a `watch` channel. Once mounted it follows its entry with no further
//! wiring: a mutation anywhere that invalidates the entry's tag moves the view
//! through `Loading` back to `Success` on its own.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use qms_core::ApiError;
use qms_core::ports::Notifier;

use crate::cache::{
    EntrySnapshot, MutationEndpoint, QueryCache, QueryEndpoint, QueryOptions, QueryStatus,
    Subscription,
};
use crate::error::decode;

/// What a view renders.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// Nothing requested yet, or cleared by a cache reset.
    Idle,
    /// Request in flight; `previous` is the last good value, if any.
    Loading { previous: Option<T> },
    Success(T),
    Error(ApiError),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ViewState::Success(data) => Some(data),
            ViewState::Loading { previous } => previous.as_ref(),
            ViewState::Idle | ViewState::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ViewState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T: DeserializeOwned> ViewState<T> {
    fn from_snapshot(snapshot: &EntrySnapshot) -> Self {
        match snapshot.status {
            QueryStatus::Uninitialized => ViewState::Idle,
            QueryStatus::Pending => ViewState::Loading {
                previous: snapshot.data_as().and_then(Result::ok),
            },
            QueryStatus::Success => match snapshot.data_as() {
                Some(Ok(data)) => ViewState::Success(data),
                Some(Err(err)) => ViewState::Error(err),
                None => ViewState::Error(ApiError::Parse("empty payload".to_string())),
            },
            QueryStatus::Error => ViewState::Error(
                snapshot
                    .error
                    .clone()
                    .unwrap_or_else(|| ApiError::Parse("missing error".to_string())),
            ),
        }
    }
}

/// A mounted query. Dropping it unmounts.
pub struct QueryView<T> {
    state: watch::Receiver<ViewState<T>>,
    subscription: Subscription,
}

impl<T> QueryView<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Subscribe to `endpoint(args)` and start loading when needed.
    ///
    /// Each transition into the error state is reported through `notifier`.
    pub fn mount<A: Serialize>(
        cache: &QueryCache,
        endpoint: &QueryEndpoint<A>,
        args: &A,
        options: QueryOptions,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let (tx, state) = watch::channel(ViewState::Idle);

        let subscription = cache.subscribe(endpoint, args, options, move |snapshot| {
            let next = ViewState::<T>::from_snapshot(snapshot);
            if let (ViewState::Error(err), Some(notifier)) = (&next, &notifier) {
                let was_error = matches!(*tx.borrow(), ViewState::Error(_));
                if !was_error {
                    notifier.error(&err.to_string());
                }
            }
            tx.send_replace(next);
        });

        Self {
            state,
            subscription,
        }
    }

    /// Current state.
    pub fn state(&self) -> ViewState<T> {
        self.state.borrow().clone()
    }

    /// Wait for the next transition and return the new state.
    pub async fn changed(&mut self) -> ViewState<T> {
        let _ = self.state.changed().await;
        self.state.borrow_and_update().clone()
    }

    /// Wait until no request is in flight and return that state.
    pub async fn settled(&mut self) -> ViewState<T> {
        loop {
            let current = self.state.borrow_and_update().clone();
            if !current.is_loading() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }

    /// Re-run the query. The view passes through `Loading` again.
    pub async fn retry(&self) -> Result<T, ApiError> {
        decode(self.subscription.refetch().await?)
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

/// One mutation trigger and its outcome.
pub struct MutationView<A> {
    cache: QueryCache,
    endpoint: MutationEndpoint<A>,
    notifier: Option<Arc<dyn Notifier>>,
    state: watch::Sender<ViewState<Value>>,
}

impl<A> MutationView<A> {
    pub fn new(
        cache: QueryCache,
        endpoint: MutationEndpoint<A>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            cache,
            endpoint,
            notifier,
            state: watch::channel(ViewState::Idle).0,
        }
    }

    /// Run the mutation. A success message from the server is shown as a
    /// success notification, a failure as an error notification.
    pub async fn trigger(&self, args: &A) -> Result<Value, ApiError> {
        self.state.send_replace(ViewState::Loading { previous: None });

        let result = self.cache.mutate(&self.endpoint, args).await;
        match &result {
            Ok(value) => {
                if let (Some(notifier), Some(message)) =
                    (&self.notifier, value.get("message").and_then(Value::as_str))
                {
                    notifier.success(message);
                }
                self.state.send_replace(ViewState::Success(value.clone()));
            }
            Err(err) => {
                if let Some(notifier) = &self.notifier {
                    notifier.error(&err.to_string());
                }
                self.state.send_replace(ViewState::Error(err.clone()));
            }
        }
        result
    }

    pub fn state(&self) -> ViewState<Value> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState<Value>> {
        self.state.subscribe()
    }

    /// Back to `Idle`, e.g. when the form is closed.
    pub fn reset(&self) {
        self.state.send_replace(ViewState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::test_support::FakeTransport;
    use qms_core::domain::{HttpMethod, HttpRequest, Tag};
    use qms_core::ports::NotificationLevel;
    use qms_infra::RecordingNotifier;
    use serde::Deserialize;
    use serde_json::json;

    const ITEMS: Tag = Tag::new("items");

    const GET_ITEMS: QueryEndpoint<()> =
        QueryEndpoint::new("items", "getItems", |_| HttpRequest::get("items"), &[ITEMS]);

    const ADD_ITEM: MutationEndpoint<()> =
        MutationEndpoint::new("items", "addItem", |_| HttpRequest::post("items"), &[ITEMS]);

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Items {
        data: Vec<u32>,
    }

    fn cache(transport: Arc<FakeTransport>) -> QueryCache {
        QueryCache::new(transport, None, CacheConfig::default())
    }

    #[tokio::test]
    async fn test_view_moves_from_loading_to_success() {
        let transport = FakeTransport::new();
        transport.on_json(HttpMethod::Get, "items", 200, json!({"data": [1, 2]}));
        transport.hold();

        let mut view = QueryView::<Items>::mount(
            &cache(transport.clone()),
            &GET_ITEMS,
            &(),
            QueryOptions::default(),
            None,
        );
        assert_eq!(view.state(), ViewState::Loading { previous: None });

        transport.release();
        assert_eq!(view.settled().await, ViewState::Success(Items { data: vec![1, 2] }));
    }

    #[tokio::test]
    async fn test_error_state_notifies_once_and_retry_recovers() {
        let transport = FakeTransport::new();
        transport.on_json(HttpMethod::Get, "items", 500, json!({"message": "Server down"}));
        let notifier = Arc::new(RecordingNotifier::new());

        let mut view = QueryView::<Items>::mount(
            &cache(transport.clone()),
            &GET_ITEMS,
            &(),
            QueryOptions::default(),
            Some(notifier.clone()),
        );

        let state = view.settled().await;
        assert_eq!(state.error().map(ToString::to_string).as_deref(), Some("Server down"));
        assert_eq!(notifier.history().len(), 1);

        transport.on_json(HttpMethod::Get, "items", 200, json!({"data": [3]}));
        let items = view.retry().await.unwrap();
        assert_eq!(items.data, vec![3]);
        assert_eq!(view.settled().await, ViewState::Success(Items { data: vec![3] }));
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_parse_error() {
        let transport = FakeTransport::new();
        transport.on_json(HttpMethod::Get, "items", 200, json!({"data": "nope"}));

        let mut view = QueryView::<Items>::mount(
            &cache(transport.clone()),
            &GET_ITEMS,
            &(),
            QueryOptions::default(),
            None,
        );
        assert!(matches!(view.settled().await, ViewState::Error(ApiError::Parse(_))));
    }

    #[tokio::test]
    async fn test_mutation_view_reports_outcome() {
        let transport = FakeTransport::new();
        transport.on_json(HttpMethod::Post, "items", 200, json!({"message": "Item added"}));
        let notifier = Arc::new(RecordingNotifier::new());

        let view = MutationView::new(cache(transport.clone()), ADD_ITEM, Some(notifier.clone()));
        view.trigger(&()).await.unwrap();

        assert!(matches!(view.state(), ViewState::Success(_)));
        assert_eq!(
            notifier.last(NotificationLevel::Success).as_deref(),
            Some("Item added")
        );

        view.reset();
        assert_eq!(view.state(), ViewState::Idle);

        transport.on_json(HttpMethod::Post, "items", 422, json!({"message": "Name taken"}));
        assert!(view.trigger(&()).await.is_err());
        assert_eq!(
            view.state().error().map(ToString::to_string).as_deref(),
            Some("Name taken")
        );
    }
}
