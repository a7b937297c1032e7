//! Client-level error types.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Errors surfaced to views by every query and mutation.
///
/// The `Display` output is the human-readable message a view shows in its
/// error notification. The type is `Clone` because a single de-duplicated
/// request settles every subscriber with the same result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never reached the server.
    #[error("Network error: {0}")]
    Network(String),

    /// Bad credentials, or a protected request rejected because of its token.
    #[error("{0}")]
    Authentication(String),

    /// The server rejected a submitted body.
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// The referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Any other failure status.
    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// The response body was not in the expected shape.
    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status that produced this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication(_) => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Validation { .. } => Some(422),
            ApiError::Network(_) | ApiError::Parse(_) => None,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    /// Field-level validation messages, empty for every other kind.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ApiError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// Session lifecycle errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("Malformed login response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Request(#[from] ApiError),

    #[error("Session storage failed: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_user_message() {
        let err = ApiError::Validation {
            message: "The email field is required.".to_string(),
            fields: BTreeMap::new(),
        };
        assert_eq!(err.to_string(), "The email field is required.");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_authentication());
        assert!(err.field_errors().is_none());
    }
}
