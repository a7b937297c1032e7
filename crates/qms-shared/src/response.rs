//! Response envelopes and error-body parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard envelope wrapped around most successful responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, alias = "success")]
    pub status: Option<bool>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: Some(true),
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            status: Some(true),
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

/// Body of a failed response, as far as the client can make sense of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBody {
    /// Human-readable message, when the server sent one.
    pub message: Option<String>,
    /// Per-field messages from a validation failure.
    pub fields: BTreeMap<String, Vec<String>>,
    /// The parsed body, when it was JSON.
    pub raw: Option<Value>,
}

impl ErrorBody {
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(_) => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                Self {
                    message: (!text.is_empty() && text.len() <= 200 && !text.starts_with('<'))
                        .then_some(text),
                    ..Self::default()
                }
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        Self {
            message: Self::extract_message(&value),
            fields: Self::extract_fields(&value),
            raw: Some(value),
        }
    }

    /// The message, or `fallback` when the server did not send one.
    pub fn message_or(&self, fallback: impl Into<String>) -> String {
        self.message.clone().unwrap_or_else(|| fallback.into())
    }

    // `message` may be a string, a list of strings or {field, message}
    // objects, or arbitrary JSON. `error` is the second choice.
    fn extract_message(value: &Value) -> Option<String> {
        match value.get("message") {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Array(items)) if !items.is_empty() => {
                let joined = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => {
                            let text = other
                                .get("message")
                                .and_then(Value::as_str)
                                .unwrap_or_default();
                            match other.get("field").and_then(Value::as_str) {
                                Some(field) => format!("{field}: {text}"),
                                None => text.to_string(),
                            }
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                return Some(joined);
            }
            Some(Value::Null) | None => {}
            Some(other @ (Value::Object(_) | Value::Bool(_) | Value::Number(_))) => {
                return Some(other.to_string());
            }
            Some(_) => {}
        }

        match value.get("error") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }

    fn extract_fields(value: &Value) -> BTreeMap<String, Vec<String>> {
        let Some(errors) = value.get("errors").and_then(Value::as_object) else {
            return BTreeMap::new();
        };

        errors
            .iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    Value::Array(items) => items
                        .iter()
                        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    other => vec![other.to_string()],
                };
                (field.clone(), messages)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_string() {
        let body = ErrorBody::from_value(json!({"message": "Invalid credentials"}));
        assert_eq!(body.message.as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_message_list_is_joined() {
        let body = ErrorBody::from_value(json!({
            "message": ["Title is required", {"field": "user_ids", "message": "must not be empty"}]
        }));
        assert_eq!(
            body.message.as_deref(),
            Some("Title is required | user_ids: must not be empty")
        );
    }

    #[test]
    fn test_error_field_fallback() {
        let body = ErrorBody::from_value(json!({"error": {"code": 7}}));
        assert_eq!(body.message.as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn test_validation_fields() {
        let body = ErrorBody::from_value(json!({
            "message": "The given data was invalid.",
            "errors": {"email": ["The email has already been taken."]}
        }));
        assert_eq!(
            body.fields.get("email"),
            Some(&vec!["The email has already been taken.".to_string()])
        );
    }

    #[test]
    fn test_html_body_has_no_message() {
        let body = ErrorBody::parse(b"<html><body>Bad Gateway</body></html>");
        assert!(body.message.is_none());
        assert_eq!(body.message_or("Request failed"), "Request failed");
    }
}
