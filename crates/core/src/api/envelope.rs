use serde::Deserialize;
use serde_json::Value;

use crate::errors::CoreError;

/// Structured failure code sent by the backend next to `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PermissionDenied,
    InvalidApiKey,
    Network,
    Timeout,
    Validation,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct Failure {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<ErrorCode>,
}

/// Split a backend response into payload or typed error.
///
/// `{success: false, error?, code?}` is a failure whose kind comes from
/// `code`; anything else, including bare arrays, is a payload.
pub fn unwrap_envelope(value: Value) -> Result<Value, CoreError> {
    let failed = value
        .get("success")
        .and_then(Value::as_bool)
        .is_some_and(|ok| !ok);
    if !failed {
        return Ok(value);
    }

    let failure: Failure = serde_json::from_value(value).unwrap_or(Failure {
        error: None,
        code: None,
    });
    let message = failure
        .error
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "request failed".to_string());

    Err(match failure.code {
        Some(ErrorCode::PermissionDenied) | Some(ErrorCode::InvalidApiKey) => {
            CoreError::Permission(message)
        }
        Some(ErrorCode::Network) | Some(ErrorCode::Timeout) => CoreError::Network(message),
        _ => CoreError::Api(message),
    })
}

/// Pull a record list out of a payload: either a bare array or `{data: [...]}`.
pub fn list_payload(value: Value) -> Result<Vec<Value>, CoreError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(CoreError::Deserialization(format!(
                "expected a list in 'data', got {other}"
            ))),
        },
        other => Err(CoreError::Deserialization(format!(
            "expected a list payload, got {other}"
        ))),
    }
}
