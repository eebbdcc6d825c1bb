use serde_json::{Map, Value};

use crate::classify;
use crate::error::ErrorObject;
use crate::params::Params;
use crate::types::Version;

/// A JSON-RPC request or notification
///
/// `id` distinguishes three states: `None` (member absent), `Some(Value::Null)`
/// (explicit notification) and any other value (a call expecting an answer).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub version: Version,
    pub method: String,
    pub params: Option<Params>,
    pub id: Option<Value>,
}

impl Request {
    pub fn new(
        version: Version,
        method: impl Into<String>,
        params: Option<Params>,
        id: Option<Value>,
    ) -> Self {
        Self {
            version,
            method: method.into(),
            params,
            id,
        }
    }

    /// Create a request that expects a response
    pub fn call(version: Version, method: impl Into<String>, params: Option<Params>, id: Value) -> Self {
        Self::new(version, method, params, Some(id))
    }

    /// Create a notification (explicit null id)
    pub fn notification(version: Version, method: impl Into<String>, params: Option<Params>) -> Self {
        Self::new(version, method, params, Some(Value::Null))
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }

    /// The id a response to this request should echo
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// Get a parameter by name (if params are named)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Get a parameter by index (if params are positional)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }

    /// Render for the wire. V2 notifications omit `id`.
    pub fn to_value(&self) -> Value {
        self.to_value_with(false)
    }

    /// Render for the wire, optionally keeping `"id": null` on V2 notifications
    pub fn to_value_with(&self, notification_id_null: bool) -> Value {
        let mut obj = Map::new();
        match self.version {
            Version::V1 => {
                obj.insert("method".to_string(), Value::String(self.method.clone()));
                let params = self
                    .params
                    .as_ref()
                    .map(Params::to_value)
                    .unwrap_or_else(|| Value::Array(Vec::new()));
                obj.insert("params".to_string(), params);
                obj.insert("id".to_string(), self.response_id());
            }
            Version::V2 => {
                obj.insert(
                    "jsonrpc".to_string(),
                    Value::String(crate::JSONRPC_VERSION.to_string()),
                );
                obj.insert("method".to_string(), Value::String(self.method.clone()));
                if let Some(params) = &self.params {
                    obj.insert("params".to_string(), params.to_value());
                }
                match &self.id {
                    Some(Value::Null) | None if notification_id_null => {
                        obj.insert("id".to_string(), Value::Null);
                    }
                    Some(Value::Null) | None => {}
                    Some(id) => {
                        obj.insert("id".to_string(), id.clone());
                    }
                }
            }
        }
        Value::Object(obj)
    }

    /// Validate a decoded value against `version` and lift it into a request
    pub fn from_value(value: Value, version: Version) -> Result<Self, ErrorObject> {
        if !classify::is_valid_request(&value, version) {
            return Err(ErrorObject::invalid_request(None));
        }
        let Value::Object(mut obj) = value else {
            return Err(ErrorObject::invalid_request(None));
        };
        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(ErrorObject::invalid_request(None)),
        };
        let params = obj.remove("params").and_then(Params::from_value);
        let id = obj.remove("id");
        Ok(Self {
            version,
            method,
            params,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v2_rendering() {
        let request = Request::call(
            Version::V2,
            "add",
            Params::from_value(json!([1, 2])),
            json!(7),
        );
        assert_eq!(
            request.to_value(),
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 7})
        );
    }

    #[test]
    fn test_v2_notification_rendering() {
        let request = Request::notification(Version::V2, "ping", None);
        assert_eq!(request.to_value(), json!({"jsonrpc": "2.0", "method": "ping"}));
        assert_eq!(
            request.to_value_with(true),
            json!({"jsonrpc": "2.0", "method": "ping", "id": null})
        );
        assert!(request.is_notification());
    }

    #[test]
    fn test_v1_rendering_always_has_params_and_id() {
        let request = Request::notification(Version::V1, "ping", None);
        assert_eq!(request.to_value(), json!({"method": "ping", "params": [], "id": null}));
    }

    #[test]
    fn test_from_value() {
        let request = Request::from_value(
            json!({"jsonrpc": "2.0", "method": "sub", "params": {"a": 1}, "id": "r1"}),
            Version::V2,
        )
        .unwrap();
        assert_eq!(request.method, "sub");
        assert_eq!(request.get_param("a"), Some(&json!(1)));
        assert_eq!(request.id, Some(json!("r1")));
        assert!(!request.is_notification());

        let absent = Request::from_value(json!({"jsonrpc": "2.0", "method": "n"}), Version::V2).unwrap();
        assert_eq!(absent.id, None);
        assert!(absent.is_notification());
        assert_eq!(absent.response_id(), Value::Null);
    }

    #[test]
    fn test_from_value_rejects_wrong_version() {
        let err = Request::from_value(json!({"method": "a", "params": [], "id": 1}), Version::V2).unwrap_err();
        assert_eq!(err.code, -32600);
    }
}
