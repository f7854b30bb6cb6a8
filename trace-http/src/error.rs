use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde_json::Value;
use trace_core::api::BackendError;

/// Maps a non-success response to a [`BackendError`]. `body` is the raw
/// response text; it may be empty or not JSON at all.
pub(crate) fn from_status(
    status: StatusCode,
    body: &str,
) -> BackendError {
    let payload: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let detail = string_field(&payload, "detail");

    match status {
        StatusCode::BAD_REQUEST => {
            let fields = field_errors(&payload);
            let message = detail
                .or_else(|| string_field(&payload, "message"))
                .or_else(|| {
                    fields
                        .values()
                        .find_map(|messages| messages.first().cloned())
                })
                .unwrap_or_else(|| "invalid data".to_string());
            BackendError::Validation { message, fields }
        }
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::FORBIDDEN => BackendError::Forbidden(
            detail.unwrap_or_else(|| "you do not have permission to perform this action".to_string()),
        ),
        StatusCode::NOT_FOUND => BackendError::NotFound,
        StatusCode::CONFLICT => BackendError::Conflict(
            detail
                .or_else(|| string_field(&payload, "message"))
                .unwrap_or_else(|| "the device changed on the server".to_string()),
        ),
        s if s.is_server_error() => BackendError::Server(format!("HTTP {}", s.as_u16())),
        s => BackendError::Server(
            detail
                .or_else(|| string_field(&payload, "message"))
                .unwrap_or_else(|| format!("HTTP {}", s.as_u16())),
        ),
    }
}

/// Connection, timeout and body-decoding failures.
pub(crate) fn from_transport(err: reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

fn string_field(
    payload: &Value,
    key: &str,
) -> Option<String> {
    payload.get(key)?.as_str().map(str::to_string)
}

/// Per-field messages from a validation payload. Both `"field": ["msg"]`
/// and `"field": "msg"` are accepted.
fn field_errors(payload: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(object) = payload.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .filter(|(key, _)| key.as_str() != "detail" && key.as_str() != "message")
        .filter_map(|(key, value)| {
            let messages = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => return None,
            };
            (!messages.is_empty()).then(|| (key.clone(), messages))
        })
        .collect()
}
