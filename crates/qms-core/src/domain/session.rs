use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login form submitted by an administrator.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// The authenticated administrator as returned by the login endpoint.
///
/// Only a handful of fields are named; everything else the backend sends is
/// kept in `extra` so it round-trips through durable storage unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// Name to greet the user with, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("admin")
    }
}

/// Credential token plus the identity it belongs to.
///
/// An identity can only exist inside a session, so there is no state with an
/// identity but no token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    identity: Identity,
}

impl Session {
    /// Returns `None` when the token is blank.
    pub fn new(token: impl Into<String>, identity: Identity) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return None;
        }
        Some(Self { token, identity })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_rejected() {
        assert!(Session::new("   ", Identity::default()).is_none());
        assert!(Session::new("abc", Identity::default()).is_some());
    }

    #[test]
    fn test_identity_keeps_unknown_fields() {
        let raw = r#"{"id":1,"email":"admin@example.com","is_admin":true}"#;
        let identity: Identity = serde_json::from_str(raw).unwrap();

        assert_eq!(identity.email.as_deref(), Some("admin@example.com"));
        assert_eq!(identity.extra.get("is_admin"), Some(&Value::Bool(true)));

        let back: Value = serde_json::to_value(&identity).unwrap();
        assert_eq!(back["is_admin"], Value::Bool(true));
    }

    #[test]
    fn test_identity_requires_an_object() {
        assert!(serde_json::from_str::<Identity>("null").is_err());
        assert!(serde_json::from_str::<Identity>("\"admin\"").is_err());
        assert!(serde_json::from_str::<Identity>("{}").is_ok());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("admin@example.com", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
