//! Error types for the dispatch engine

use serde_json::Value;
use tandem_json_rpc::{ErrorObject, classify};
use thiserror::Error;

/// Registration-time failures. These are programmer errors and are reported
/// immediately instead of being turned into protocol responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Method name must not be empty")]
    EmptyName,

    #[error("Method name '{0}' uses the reserved 'rpc.' prefix")]
    ReservedName(String),
}

/// Failure reported by a method handler
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerError {
    /// A well-formed JSON-RPC error, relayed to the caller verbatim
    #[error("{0}")]
    Rpc(ErrorObject),

    /// Anything else; the caller sees INTERNAL_ERROR
    #[error("Handler fault: {0}")]
    Fault(String),
}

impl HandlerError {
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault(message.into())
    }

    pub fn into_error_object(self) -> ErrorObject {
        match self {
            HandlerError::Rpc(error) => error,
            HandlerError::Fault(message) => ErrorObject::internal_error(Some(message)),
        }
    }
}

impl From<ErrorObject> for HandlerError {
    fn from(error: ErrorObject) -> Self {
        HandlerError::Rpc(error)
    }
}

/// Error-shaped values pass through as JSON-RPC errors; anything else is a fault
impl From<Value> for HandlerError {
    fn from(value: Value) -> Self {
        if classify::is_valid_error_shape(&value) {
            if let Some(error) = ErrorObject::from_value(&value) {
                return HandlerError::Rpc(error);
            }
        }
        HandlerError::Fault(value.to_string())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        HandlerError::Fault(format!("{:#}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_shaped_value_passes_through() {
        let err = HandlerError::from(json!({"code": 42, "message": "custom", "data": [1]}));
        let object = err.into_error_object();
        assert_eq!(object.code, 42);
        assert_eq!(object.message, "custom");
        assert_eq!(object.data, Some(json!([1])));
    }

    #[test]
    fn test_malformed_error_becomes_internal_error() {
        let object = HandlerError::from(json!({"code": "42"})).into_error_object();
        assert_eq!(object.code, -32603);

        let object = HandlerError::from(anyhow::anyhow!("disk on fire")).into_error_object();
        assert_eq!(object.code, -32603);
        assert_eq!(object.data, Some(json!("disk on fire")));
    }
}
