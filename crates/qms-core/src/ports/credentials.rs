//! Credential source consulted by every outgoing request.

use async_trait::async_trait;

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Token to send as a bearer credential, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// Called when the server answered 401 to a request that carried `token`.
    ///
    /// Implementations end the session only if `token` is still the current one.
    async fn token_rejected(&self, token: &str);
}
