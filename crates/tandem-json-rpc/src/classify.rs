//! Side-effect free predicates over decoded JSON values.
//!
//! These answer "what is this message" before anything is converted into typed
//! structures, so they operate on raw [`Value`]s.

use serde_json::Value;

use crate::types::Version;

/// True iff the message is an ordered sequence rather than a single object
pub fn is_batch(value: &Value) -> bool {
    value.is_array()
}

/// True iff `id` is absent or explicitly null
pub fn is_notification(request: &Value) -> bool {
    match request.get("id") {
        None | Some(Value::Null) => true,
        Some(_) => false,
    }
}

/// A 1.0 request never carries a `jsonrpc` member
pub fn is_valid_v1_request(request: &Value) -> bool {
    let Some(obj) = request.as_object() else {
        return false;
    };
    !obj.contains_key("jsonrpc")
        && matches!(obj.get("method"), Some(Value::String(_)))
        && matches!(obj.get("params"), Some(Value::Array(_)))
        && obj.contains_key("id")
}

pub fn is_valid_v2_request(request: &Value) -> bool {
    let Some(obj) = request.as_object() else {
        return false;
    };
    let version_ok = matches!(obj.get("jsonrpc"), Some(Value::String(v)) if v == crate::JSONRPC_VERSION);
    let method_ok = matches!(obj.get("method"), Some(Value::String(_)));
    let params_ok = matches!(
        obj.get("params"),
        None | Some(Value::Array(_)) | Some(Value::Object(_))
    );
    let id_ok = matches!(
        obj.get("id"),
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Number(_))
    );
    version_ok && method_ok && params_ok && id_ok
}

pub fn is_valid_request(request: &Value, version: Version) -> bool {
    match version {
        Version::V1 => is_valid_v1_request(request),
        Version::V2 => is_valid_v2_request(request),
    }
}

/// Code must be an integer and message a string
pub fn is_valid_error_shape(error: &Value) -> bool {
    let Some(obj) = error.as_object() else {
        return false;
    };
    let code_ok = obj.get("code").and_then(Value::as_i64).is_some();
    let message_ok = matches!(obj.get("message"), Some(Value::String(_)));
    code_ok && message_ok
}

pub fn is_valid_response(response: &Value, version: Version) -> bool {
    let Some(obj) = response.as_object() else {
        return false;
    };
    if !obj.contains_key("id") {
        return false;
    }
    match version {
        Version::V1 => {
            let (Some(result), Some(error)) = (obj.get("result"), obj.get("error")) else {
                return false;
            };
            error.is_null() || (result.is_null() && is_valid_error_shape(error))
        }
        Version::V2 => {
            let version_ok =
                matches!(obj.get("jsonrpc"), Some(Value::String(v)) if v == crate::JSONRPC_VERSION);
            let exclusive = match (obj.get("result"), obj.get("error")) {
                (Some(_), None) => true,
                (None, Some(error)) => is_valid_error_shape(error),
                _ => false,
            };
            version_ok && exclusive
        }
    }
}
