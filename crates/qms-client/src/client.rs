use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use qms_core::AuthError;
use qms_core::domain::{Credentials, Identity};
use qms_core::ports::{KeyValueStorage, Notifier, Transport};

use crate::api::{
    AdsApi, BidsApi, CategoriesApi, CmsApi, DashboardApi, DiscountsApi, EmailApi, FaqApi,
    NotificationsApi, OrdersApi, ProvidersApi, SubscriptionsApi, TransactionsApi, UsersApi,
};
use crate::cache::{CacheConfig, MutationEndpoint, QueryCache, QueryEndpoint, QueryOptions};
use crate::session::SessionStore;
use crate::view::{MutationView, QueryView};

/// Keeps cached data from crossing a session boundary.
///
/// Remembers the token the cache was filled under; any other token, or none,
/// resets the cache. Applying the same token twice is a no-op.
struct SessionBoundary {
    cache: QueryCache,
    token: Mutex<Option<String>>,
}

impl SessionBoundary {
    fn apply(&self, token: Option<String>) {
        let mut current = self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *current == token {
            return;
        }
        tracing::debug!(
            authenticated = token.is_some(),
            "Session changed, resetting query cache"
        );
        let signed_in = token.is_some();
        *current = token;
        if signed_in {
            self.cache.reload();
        } else {
            self.cache.reset();
        }
    }
}

/// Apply every session change, whatever its source: login, logout, restore
/// from another context or a rejected token.
fn follow_session(session: &SessionStore, boundary: Weak<SessionBoundary>) {
    let mut changes = session.subscribe();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let token = changes
                .borrow_and_update()
                .as_ref()
                .map(|session| session.token().to_string());
            let Some(boundary) = boundary.upgrade() else {
                break;
            };
            boundary.apply(token);
        }
    });
}

/// The admin dashboard's data layer, wired together.
///
/// Owns the session store and the query cache; every request made through the
/// cache carries the session's bearer token, and nothing cached under one
/// session is served to another.
#[derive(Clone)]
pub struct AdminClient {
    session: Arc<SessionStore>,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    boundary: Arc<SessionBoundary>,
}

impl AdminClient {
    /// Must be called inside a Tokio runtime.
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
        config: CacheConfig,
    ) -> Self {
        let session = Arc::new(SessionStore::new(
            transport.clone(),
            storage,
            notifier.clone(),
        ));
        let cache = QueryCache::new(transport, Some(session.clone()), config);
        let boundary = Arc::new(SessionBoundary {
            cache: cache.clone(),
            token: Mutex::new(None),
        });
        follow_session(&session, Arc::downgrade(&boundary));

        Self {
            session,
            cache,
            notifier,
            boundary,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Log in, dropping anything cached for a previous session and refetching
    /// every mounted view.
    pub async fn login(&self, credentials: Credentials) -> Result<Identity, AuthError> {
        let identity = self.session.login(credentials).await?;
        self.boundary.apply(self.session.token());
        Ok(identity)
    }

    /// Log out and forget every cached payload.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.boundary.apply(None);
    }

    /// Mount a view over `endpoint(args)` that reports errors as notifications.
    pub fn view<A, T>(&self, endpoint: &QueryEndpoint<A>, args: &A) -> QueryView<T>
    where
        A: Serialize,
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.view_with(endpoint, args, QueryOptions::default())
    }

    pub fn view_with<A, T>(
        &self,
        endpoint: &QueryEndpoint<A>,
        args: &A,
        options: QueryOptions,
    ) -> QueryView<T>
    where
        A: Serialize,
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        QueryView::mount(&self.cache, endpoint, args, options, Some(self.notifier.clone()))
    }

    pub fn mutation<A>(&self, endpoint: MutationEndpoint<A>) -> MutationView<A> {
        MutationView::new(self.cache.clone(), endpoint, Some(self.notifier.clone()))
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.cache.clone())
    }

    pub fn providers(&self) -> ProvidersApi {
        ProvidersApi::new(self.cache.clone())
    }

    pub fn bids(&self) -> BidsApi {
        BidsApi::new(self.cache.clone())
    }

    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.cache.clone())
    }

    pub fn ads(&self) -> AdsApi {
        AdsApi::new(self.cache.clone())
    }

    pub fn faq(&self) -> FaqApi {
        FaqApi::new(self.cache.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.cache.clone())
    }

    pub fn subscriptions(&self) -> SubscriptionsApi {
        SubscriptionsApi::new(self.cache.clone())
    }

    pub fn transactions(&self) -> TransactionsApi {
        TransactionsApi::new(self.cache.clone())
    }

    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.cache.clone())
    }

    pub fn cms(&self) -> CmsApi {
        CmsApi::new(self.cache.clone())
    }

    pub fn discounts(&self) -> DiscountsApi {
        DiscountsApi::new(self.cache.clone())
    }

    pub fn dashboard(&self) -> DashboardApi {
        DashboardApi::new(self.cache.clone())
    }

    pub fn email(&self) -> EmailApi {
        EmailApi::new(self.cache.clone())
    }
}
