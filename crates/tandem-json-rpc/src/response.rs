use serde_json::{Map, Value};

use crate::classify;
use crate::error::ErrorObject;
use crate::types::Version;

/// What a response carries: a result or an error, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Result(Value),
    Error(ErrorObject),
}

/// A JSON-RPC response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Value,
    pub payload: Payload,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            payload: Payload::Result(result),
        }
    }

    pub fn error(id: Value, error: ErrorObject) -> Self {
        Self {
            id,
            payload: Payload::Error(error),
        }
    }

    /// Build from a handler outcome. The error wins when both are present.
    pub fn from_outcome(id: Value, error: Option<ErrorObject>, result: Option<Value>) -> Self {
        match error {
            Some(error) => Self::error(id, error),
            None => Self::success(id, result.unwrap_or(Value::Null)),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Result(value) => Some(value),
            Payload::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.payload {
            Payload::Error(error) => Some(error),
            Payload::Result(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, ErrorObject> {
        match self.payload {
            Payload::Result(value) => Ok(value),
            Payload::Error(error) => Err(error),
        }
    }

    /// Render for the wire.
    ///
    /// V1 always carries both `result` and `error`, one of them null. V2 carries
    /// the `jsonrpc` tag and exactly one of the two.
    pub fn to_value(&self, version: Version) -> Value {
        let mut obj = Map::new();
        match version {
            Version::V1 => {
                let (result, error) = match &self.payload {
                    Payload::Result(value) => (value.clone(), Value::Null),
                    Payload::Error(error) => (Value::Null, error.to_value()),
                };
                obj.insert("result".to_string(), result);
                obj.insert("error".to_string(), error);
            }
            Version::V2 => {
                obj.insert(
                    "jsonrpc".to_string(),
                    Value::String(crate::JSONRPC_VERSION.to_string()),
                );
                match &self.payload {
                    Payload::Result(value) => {
                        obj.insert("result".to_string(), value.clone());
                    }
                    Payload::Error(error) => {
                        obj.insert("error".to_string(), error.to_value());
                    }
                }
            }
        }
        obj.insert("id".to_string(), self.id.clone());
        Value::Object(obj)
    }

    /// Read a response of the given version off the wire
    pub fn from_value(value: &Value, version: Version) -> Option<Self> {
        if !classify::is_valid_response(value, version) {
            return None;
        }
        let obj = value.as_object()?;
        let id = obj.get("id").cloned().unwrap_or(Value::Null);
        match obj.get("error") {
            Some(error) if !error.is_null() => {
                Some(Self::error(id, ErrorObject::from_value(error)?))
            }
            _ => Some(Self::success(
                id,
                obj.get("result").cloned().unwrap_or(Value::Null),
            )),
        }
    }
}
