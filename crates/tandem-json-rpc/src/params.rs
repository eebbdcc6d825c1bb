use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorObject;

/// Parameters for a JSON-RPC call
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Params {
    /// Positional parameters as an array
    Positional(Vec<Value>),
    /// Named parameters as an object
    Named(Map<String, Value>),
}

impl Params {
    /// Accept an array or an object; anything else is not a parameter structure
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Params::Positional(items)),
            Value::Object(map) => Some(Params::Named(map)),
            _ => None,
        }
    }

    /// Get a parameter by name (named params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Params::Named(map) => map.get(key),
            Params::Positional(_) => None,
        }
    }

    /// Get a parameter by index (positional params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Params::Positional(items) => items.get(index),
            Params::Named(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Params::Named(map) => map.len(),
            Params::Positional(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Params::Positional(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Params::Named(map) => Value::Object(map.clone()),
            Params::Positional(items) => Value::Array(items.clone()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Params::Named(map) => Value::Object(map),
            Params::Positional(items) => Value::Array(items),
        }
    }

    /// Project onto declared names in order. Missing names become `null`.
    pub fn into_ordered(self, names: &[String]) -> Vec<Value> {
        match self {
            Params::Positional(items) => items,
            Params::Named(mut map) => names
                .iter()
                .map(|name| map.remove(name).unwrap_or(Value::Null))
                .collect(),
        }
    }

    /// Project onto declared names by position. Surplus positional values are dropped.
    pub fn into_named(self, names: &[String]) -> Map<String, Value> {
        match self {
            Params::Named(map) => map,
            Params::Positional(items) => names.iter().cloned().zip(items).collect(),
        }
    }

    /// Deserialize into a typed argument structure
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ErrorObject> {
        serde_json::from_value(self.to_value())
            .map_err(|e| ErrorObject::invalid_params(&e.to_string()))
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params::Named(map)
    }
}

impl From<Vec<Value>> for Params {
    fn from(items: Vec<Value>) -> Self {
        Params::Positional(items)
    }
}
