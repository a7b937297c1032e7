//! Session store - the single source of truth for the admin credential.
//!
//! Durable layout: the token under [`TOKEN_KEY`], the identity as JSON under
//! [`IDENTITY_KEY`]. Login writes the identity before the token and logout
//! removes the token before the identity, so a reader racing a write in
//! another process never sees a token without its identity.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use qms_core::domain::{Credentials, Identity, Session};
use qms_core::ports::{CredentialProvider, KeyValueStorage, Notifier, Transport};
use qms_core::{ApiError, AuthError};
use qms_shared::{ErrorBody, LoginResponse};

use crate::api::auth::{CHANGE_PASSWORD, ChangePasswordForm, LOGIN};
use crate::error::normalize;

pub const TOKEN_KEY: &str = "qms_admin_token";
pub const IDENTITY_KEY: &str = "qms_admin_user";

const LOGIN_SUCCEEDED: &str = "Login successful!";
const LOGIN_FAILED: &str = "Login failed! Please check credentials.";
const LOGGED_OUT: &str = "Logged out successfully";

pub struct SessionStore {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStorage>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<Option<Session>>,
    // Serializes login, logout and restore so their storage writes never interleave
    lifecycle: Mutex<()>,
}

impl SessionStore {
    /// Create a logged-out store. Call [`restore_session`](Self::restore_session)
    /// to pick up a session persisted by an earlier run.
    pub fn new(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            storage,
            notifier,
            state: watch::channel(None).0,
            lifecycle: Mutex::new(()),
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On any failure the previous state, in memory and on disk, is kept.
    pub async fn login(&self, credentials: Credentials) -> Result<Identity, AuthError> {
        let _guard = self.lifecycle.lock().await;

        let session = match self.authenticate(&credentials).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(email = %credentials.email, error = %err, "Login failed");
                self.notifier.error(&err.to_string());
                return Err(err);
            }
        };

        if let Err(err) = self.persist(&session).await {
            tracing::error!(error = %err, "Failed to persist session");
            self.notifier.error(&err.to_string());
            return Err(err);
        }

        let identity = session.identity().clone();
        self.state.send_replace(Some(session));

        tracing::info!(admin = %identity.display_name(), "Admin logged in");
        self.notifier.success(LOGIN_SUCCEEDED);
        Ok(identity)
    }

    /// End the session. Storage failures are logged, never returned.
    pub async fn logout(&self) {
        let _guard = self.lifecycle.lock().await;
        self.clear_durable().await;
        self.state.send_replace(None);

        tracing::info!("Admin logged out");
        self.notifier.info(LOGGED_OUT);
    }

    /// Rebuild the in-memory session from durable storage.
    ///
    /// A token without an identity, or an identity without a token, restores
    /// as logged out. An identity that is not a JSON object is treated as
    /// corruption and both keys are removed.
    pub async fn restore_session(&self) -> Option<Session> {
        let _guard = self.lifecycle.lock().await;
        let restored = self.read_durable().await;

        self.state.send_if_modified(|current| {
            if *current == restored {
                return false;
            }
            *current = restored.clone();
            true
        });

        tracing::debug!(authenticated = restored.is_some(), "Session restored");
        restored
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.token().to_string())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().as_ref().map(|s| s.identity().clone())
    }

    /// Receiver notified on every login, logout and restore that changes the session.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// Follow durable-storage changes made by other handles, restoring on each.
    ///
    /// The task stops when the store is dropped or the change stream ends.
    pub fn watch_storage(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let mut changes = self.storage.changes();

        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                if change.key != TOKEN_KEY && change.key != IDENTITY_KEY {
                    continue;
                }
                let Some(store) = store.upgrade() else {
                    break;
                };
                tracing::debug!(key = %change.key, "Session changed in another context");
                store.restore_session().await;
            }
        })
    }

    /// Change the logged-in administrator's password.
    pub async fn change_password(&self, form: &ChangePasswordForm) -> Result<Value, ApiError> {
        let Some(token) = self.token() else {
            return Err(ApiError::Authentication("Not logged in".to_string()));
        };

        let request = CHANGE_PASSWORD.request(form);
        let result = normalize(self.transport.send(&request, Some(&token)).await);
        match &result {
            Ok(_) => {
                tracing::info!("Admin password changed");
                self.notifier.success("Password changed successfully");
            }
            Err(err) => {
                self.notifier.error(&err.to_string());
                if err.is_authentication() {
                    self.token_rejected(&token).await;
                }
            }
        }
        result
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let request = LOGIN.request(credentials);
        let response = self
            .transport
            .send(&request, None)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if matches!(response.status, 400 | 401 | 422) {
            let body = ErrorBody::parse(&response.body);
            return Err(AuthError::InvalidCredentials(body.message_or(LOGIN_FAILED)));
        }

        let value = normalize(Ok(response))?;
        let login: LoginResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        let token = login
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AuthError::MalformedResponse("no token in response".to_string()))?;

        let identity = match login.user {
            Some(user @ Value::Object(_)) => serde_json::from_value::<Identity>(user)
                .map_err(|e| AuthError::MalformedResponse(e.to_string()))?,
            _ => return Err(AuthError::MalformedResponse("no user in response".to_string())),
        };

        Session::new(token, identity)
            .ok_or_else(|| AuthError::MalformedResponse("blank token".to_string()))
    }

    async fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let identity = serde_json::to_string(session.identity())
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let previous = self.state.borrow().clone();

        self.storage
            .set(IDENTITY_KEY, &identity)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        if let Err(e) = self.storage.set(TOKEN_KEY, session.token()).await {
            self.rollback_identity(previous.as_ref()).await;
            return Err(AuthError::Storage(e.to_string()));
        }
        Ok(())
    }

    // Put the identity key back to match the session still in memory.
    async fn rollback_identity(&self, previous: Option<&Session>) {
        let result = match previous.map(|s| serde_json::to_string(s.identity())) {
            Some(Ok(json)) => self.storage.set(IDENTITY_KEY, &json).await,
            _ => self.storage.remove(IDENTITY_KEY).await,
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to roll back stored identity");
        }
    }

    async fn read_durable(&self) -> Option<Session> {
        let token = match self.storage.get(TOKEN_KEY).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored token");
                return None;
            }
        };
        let identity = match self.storage.get(IDENTITY_KEY).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored identity");
                return None;
            }
        };

        let (Some(token), Some(identity)) = (token, identity) else {
            return None;
        };

        match serde_json::from_str::<Identity>(&identity) {
            Ok(identity) => Session::new(token, identity),
            Err(e) => {
                tracing::warn!(error = %e, "Stored identity is corrupt, clearing session");
                self.clear_durable().await;
                None
            }
        }
    }

    async fn clear_durable(&self) {
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                tracing::warn!(key, error = %e, "Failed to remove stored session key");
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }

    async fn token_rejected(&self, token: &str) {
        let _guard = self.lifecycle.lock().await;
        if self.token().as_deref() != Some(token) {
            return;
        }

        tracing::warn!("Session token rejected, logging out");
        self.clear_durable().await;
        self.state.send_replace(None);
        self.notifier
            .error("Your session has expired. Please log in again.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use qms_core::domain::HttpMethod;
    use qms_core::ports::NotificationLevel;
    use qms_infra::{InMemoryStorage, RecordingNotifier};
    use serde_json::json;

    struct Fixture {
        transport: Arc<FakeTransport>,
        storage: Arc<InMemoryStorage>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<SessionStore>,
    }

    fn fixture() -> Fixture {
        let transport = FakeTransport::new();
        let storage = Arc::new(InMemoryStorage::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let store = Arc::new(SessionStore::new(
            transport.clone(),
            storage.clone(),
            notifier.clone(),
        ));
        Fixture {
            transport,
            storage,
            notifier,
            store,
        }
    }

    fn accept_login(transport: &FakeTransport, token: &str) {
        transport.on_json(
            HttpMethod::Post,
            "login",
            200,
            json!({
                "token": token,
                "user": {"id": 1, "name": "Asha", "email": "admin@example.com", "role": "admin"}
            }),
        );
    }

    #[tokio::test]
    async fn test_login_persists_identity_and_token() {
        let f = fixture();
        accept_login(&f.transport, "tok-1");

        let identity = f
            .store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();

        assert_eq!(identity.name.as_deref(), Some("Asha"));
        assert!(f.store.is_authenticated());
        assert_eq!(f.store.token().as_deref(), Some("tok-1"));
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
        let stored: Identity =
            serde_json::from_str(&f.storage.get(IDENTITY_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(stored, identity);
        assert_eq!(
            f.notifier.last(NotificationLevel::Success).as_deref(),
            Some(LOGIN_SUCCEEDED)
        );
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_logged_out_state() {
        let f = fixture();
        f.transport
            .on_json(HttpMethod::Post, "login", 401, json!({"message": "Invalid credentials"}));

        let err = f
            .store
            .login(Credentials::new("admin@example.com", "wrong"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Invalid credentials"));
        assert!(!f.store.is_authenticated());
        assert_eq!(f.store.identity(), None);
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(
            f.notifier.last(NotificationLevel::Error).as_deref(),
            Some("Invalid credentials")
        );
    }

    #[tokio::test]
    async fn test_rejected_login_without_message_uses_default() {
        let f = fixture();
        f.transport.on_json(HttpMethod::Post, "login", 422, json!({}));

        let err = f
            .store
            .login(Credentials::new("admin@example.com", ""))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_session() {
        let f = fixture();
        accept_login(&f.transport, "tok-1");
        f.store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();

        f.transport.on_json(HttpMethod::Post, "login", 200, json!({"token": ""}));
        let err = f
            .store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)));
        assert_eq!(f.store.token().as_deref(), Some("tok-1"));
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("tok-1"));
    }

    #[tokio::test]
    async fn test_network_failure_is_reported() {
        let f = fixture();
        f.transport.on_error(
            HttpMethod::Post,
            "login",
            qms_core::ports::TransportError::Connection("refused".to_string()),
        );

        let err = f
            .store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Request(ApiError::Network(_))));
        assert!(!f.store.is_authenticated());
    }

    /// Storage whose token writes always fail.
    struct TokenWriteFails(InMemoryStorage);

    #[async_trait]
    impl KeyValueStorage for TokenWriteFails {
        async fn get(&self, key: &str) -> Result<Option<String>, qms_core::ports::StorageError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), qms_core::ports::StorageError> {
            if key == TOKEN_KEY {
                return Err(qms_core::ports::StorageError::Io("disk full".to_string()));
            }
            self.0.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), qms_core::ports::StorageError> {
            self.0.remove(key).await
        }

        fn changes(&self) -> futures::stream::BoxStream<'static, qms_core::ports::StorageChange> {
            self.0.changes()
        }
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_login() {
        let transport = FakeTransport::new();
        accept_login(&transport, "tok-1");
        let storage = Arc::new(TokenWriteFails(InMemoryStorage::new()));
        let store = SessionStore::new(
            transport.clone(),
            storage.clone(),
            Arc::new(RecordingNotifier::new()),
        );

        let err = store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Storage(_)));
        assert!(!store.is_authenticated());
        // The identity written first is rolled back
        assert_eq!(storage.get(IDENTITY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_memory_and_storage() {
        let f = fixture();
        accept_login(&f.transport, "tok-1");
        f.store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();

        f.store.logout().await;

        assert_eq!(f.store.session(), None);
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(f.storage.get(IDENTITY_KEY).await.unwrap(), None);
        assert_eq!(
            f.notifier.last(NotificationLevel::Info).as_deref(),
            Some(LOGGED_OUT)
        );

        // Logging out twice is harmless
        f.store.logout().await;
        assert!(!f.store.is_authenticated());
    }

    #[tokio::test]
    async fn test_restore_is_idempotent() {
        let f = fixture();
        f.storage.set(TOKEN_KEY, "tok-9").await.unwrap();
        f.storage
            .set(IDENTITY_KEY, r#"{"id":3,"email":"ops@example.com","team":"north"}"#)
            .await
            .unwrap();

        let first = f.store.restore_session().await;
        let second = f.store.restore_session().await;

        assert!(first.is_some());
        assert_eq!(first, second);
        let identity = f.store.identity().unwrap();
        assert_eq!(identity.email.as_deref(), Some("ops@example.com"));
        assert_eq!(identity.extra["team"], json!("north"));
    }

    #[tokio::test]
    async fn test_partial_storage_restores_logged_out() {
        let f = fixture();
        f.storage.set(TOKEN_KEY, "orphan").await.unwrap();

        assert_eq!(f.store.restore_session().await, None);
        assert!(!f.store.is_authenticated());
        // Only the in-memory state is cleared
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("orphan"));
    }

    #[tokio::test]
    async fn test_corrupt_identity_clears_storage() {
        let f = fixture();
        f.storage.set(TOKEN_KEY, "tok").await.unwrap();
        f.storage.set(IDENTITY_KEY, "undefined").await.unwrap();

        assert_eq!(f.store.restore_session().await, None);
        assert_eq!(f.store.restore_session().await, None);
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap(), None);
        assert_eq!(f.storage.get(IDENTITY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_token_ends_only_the_current_session() {
        let f = fixture();
        accept_login(&f.transport, "tok-2");
        f.store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();

        f.store.token_rejected("tok-1").await;
        assert!(f.store.is_authenticated());

        f.store.token_rejected("tok-2").await;
        assert!(!f.store.is_authenticated());
        assert_eq!(f.storage.get(TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_other_handle_sees_login_and_logout() {
        let f = fixture();
        accept_login(&f.transport, "tok-1");

        let other = Arc::new(SessionStore::new(
            f.transport.clone(),
            Arc::new(f.storage.handle()),
            Arc::new(RecordingNotifier::new()),
        ));
        let watcher = other.watch_storage();
        let mut changes = other.subscribe();

        f.store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();
        changes
            .wait_for(|session| session.as_ref().is_some_and(|s| s.token() == "tok-1"))
            .await
            .unwrap();

        f.store.logout().await;
        changes.wait_for(Option::is_none).await.unwrap();

        watcher.abort();
    }

    #[tokio::test]
    async fn test_change_password_requires_a_session() {
        let f = fixture();
        let err = f
            .store
            .change_password(&ChangePasswordForm::new("old", "new"))
            .await
            .unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(f.transport.count("reset-pass/all"), 0);
    }

    #[tokio::test]
    async fn test_change_password_sends_the_bearer_token() {
        let f = fixture();
        accept_login(&f.transport, "tok-1");
        f.store
            .login(Credentials::new("admin@example.com", "secret"))
            .await
            .unwrap();
        f.transport
            .on_json(HttpMethod::Post, "reset-pass/all", 200, json!({"status": true}));

        f.store
            .change_password(&ChangePasswordForm::new("secret", "better-secret"))
            .await
            .unwrap();

        let call = f.transport.calls().pop().unwrap();
        assert_eq!(call.bearer.as_deref(), Some("tok-1"));
    }
}
