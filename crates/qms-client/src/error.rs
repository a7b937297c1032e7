//! Normalization of transport results into the [`ApiError`] taxonomy.

use serde::de::DeserializeOwned;
use serde_json::Value;

use qms_core::ApiError;
use qms_core::ports::{TransportError, TransportResponse};
use qms_shared::ErrorBody;

/// Map a raw transport result onto a JSON payload or an [`ApiError`].
///
/// Views never see status codes; this is the only place they are read.
pub fn normalize(result: Result<TransportResponse, TransportError>) -> Result<Value, ApiError> {
    let response = result.map_err(|e| ApiError::Network(e.to_string()))?;

    if response.is_success() {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        return serde_json::from_slice(&response.body).map_err(|e| ApiError::Parse(e.to_string()));
    }

    let body = ErrorBody::parse(&response.body);
    Err(match response.status {
        401 => ApiError::Authentication(body.message_or("Your session has expired. Please log in again.")),
        400 | 422 => ApiError::Validation {
            message: body.message_or("The submitted data is invalid."),
            fields: body.fields,
        },
        404 => ApiError::NotFound(body.message_or("The requested resource was not found.")),
        status => ApiError::Server {
            status,
            message: body.message_or(format!("Request failed with status {status}")),
            body: body.raw,
        },
    })
}

/// Deserialize a cached payload into a typed record.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: Value) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(status, serde_json::to_vec(&body).unwrap()))
    }

    #[test]
    fn test_success_body_is_parsed() {
        let value = normalize(response(200, json!({"data": [1, 2]}))).unwrap();
        assert_eq!(value["data"], json!([1, 2]));
    }

    #[test]
    fn test_empty_success_body_is_null() {
        let value = normalize(Ok(TransportResponse::new(204, Vec::new()))).unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn test_non_json_success_is_a_parse_error() {
        let result = normalize(Ok(TransportResponse::new(200, b"<html>".to_vec())));
        assert!(matches!(result, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            normalize(response(401, json!({"message": "Unauthenticated."}))),
            Err(ApiError::Authentication(m)) if m == "Unauthenticated."
        ));
        assert!(matches!(
            normalize(response(404, json!({}))),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            normalize(response(500, json!({"error": "boom"}))),
            Err(ApiError::Server { status: 500, message, .. }) if message == "boom"
        ));
    }

    #[test]
    fn test_validation_keeps_field_errors() {
        let err = normalize(response(
            422,
            json!({"message": "Invalid.", "errors": {"question": ["The question field is required."]}}),
        ))
        .unwrap_err();

        let fields = err.field_errors().unwrap();
        assert_eq!(fields["question"], vec!["The question field is required.".to_string()]);
    }

    #[test]
    fn test_transport_failure_is_a_network_error() {
        let err = normalize(Err(TransportError::Timeout)).unwrap_err();
        assert_eq!(err, ApiError::Network("Request timed out".to_string()));
    }
}
