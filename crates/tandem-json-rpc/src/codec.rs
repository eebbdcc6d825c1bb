//! Text boundary: turning wire payloads into JSON values and back.
//!
//! The codec is where the configured reviver/replacer hooks run. A reviver is
//! applied bottom-up after parsing (children before parents, the root last with
//! key `""`); a replacer is applied top-down before serialization (the root first,
//! then whatever children the replaced value has). A pair of hooks that invert
//! each other gives lossless round trips for domain values.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::CodecError;
use crate::response::Response;
use crate::types::{Encoding, Version};

/// Per key/value transform run during decode (reviver) or encode (replacer)
pub type Hook = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// A decoded inbound payload
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Single(Value),
    Batch(Vec<Value>),
}

impl Message {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Message::Batch(items),
            other => Message::Single(other),
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Message::Batch(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Message::Single(value) => value,
            Message::Batch(items) => Value::Array(items),
        }
    }
}

/// An outbound answer: one response or the aggregate of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Single(Response),
    Batch(Vec<Response>),
}

impl Reply {
    pub fn to_value(&self, version: Version) -> Value {
        match self {
            Reply::Single(response) => response.to_value(version),
            Reply::Batch(responses) => Value::Array(
                responses.iter().map(|r| r.to_value(version)).collect(),
            ),
        }
    }

    pub fn into_single(self) -> Option<Response> {
        match self {
            Reply::Single(response) => Some(response),
            Reply::Batch(_) => None,
        }
    }

    pub fn into_batch(self) -> Option<Vec<Response>> {
        match self {
            Reply::Batch(responses) => Some(responses),
            Reply::Single(_) => None,
        }
    }
}

/// Wire codec bound to one protocol version, charset and hook pair
#[derive(Clone, Default)]
pub struct Codec {
    version: Version,
    encoding: Encoding,
    reviver: Option<Hook>,
    replacer: Option<Hook>,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("version", &self.version)
            .field("encoding", &self.encoding)
            .field("reviver", &self.reviver.is_some())
            .field("replacer", &self.replacer.is_some())
            .finish()
    }
}

impl Codec {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_reviver(mut self, reviver: Hook) -> Self {
        self.reviver = Some(reviver);
        self
    }

    pub fn with_replacer(mut self, replacer: Hook) -> Self {
        self.replacer = Some(replacer);
        self
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Parse text and run the reviver
    pub fn decode_value(&self, text: &str) -> Result<Value, CodecError> {
        let value: Value = serde_json::from_str(text).map_err(CodecError::Parse)?;
        Ok(self.revive(value))
    }

    /// Parse text into a single message or a batch
    pub fn decode(&self, text: &str) -> Result<Message, CodecError> {
        let message = Message::from_value(self.decode_value(text)?);
        debug!(batch = message.is_batch(), "Decoded JSON-RPC payload");
        Ok(message)
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        let text = self.bytes_to_text(bytes)?;
        self.decode(&text)
    }

    /// Run the replacer and serialize
    pub fn encode_value(&self, value: &Value) -> Result<String, CodecError> {
        let value = self.replace(value.clone());
        serde_json::to_string(&value).map_err(CodecError::Serialize)
    }

    pub fn encode_reply(&self, reply: &Reply) -> Result<String, CodecError> {
        self.encode_value(&reply.to_value(self.version))
    }

    pub fn encode_bytes(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let text = self.encode_value(value)?;
        self.text_to_bytes(&text)
    }

    pub fn bytes_to_text(&self, bytes: &[u8]) -> Result<String, CodecError> {
        match self.encoding {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| CodecError::Encoding(e.to_string())),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    pub fn text_to_bytes(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        match self.encoding {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        CodecError::Encoding(format!("character {:?} is not representable in latin1", c))
                    })
                })
                .collect(),
        }
    }

    pub fn revive(&self, value: Value) -> Value {
        match &self.reviver {
            Some(hook) => revive_walk(hook.as_ref(), "", value),
            None => value,
        }
    }

    pub fn replace(&self, value: Value) -> Value {
        match &self.replacer {
            Some(hook) => replace_walk(hook.as_ref(), "", value),
            None => value,
        }
    }
}

fn revive_walk(hook: &(dyn Fn(&str, Value) -> Value + Send + Sync), key: &str, value: Value) -> Value {
    let value = match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let revived = revive_walk(hook, &k, v);
                    (k, revived)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| revive_walk(hook, &i.to_string(), v))
                .collect(),
        ),
        other => other,
    };
    hook(key, value)
}

fn replace_walk(hook: &(dyn Fn(&str, Value) -> Value + Send + Sync), key: &str, value: Value) -> Value {
    match hook(key, value) {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let replaced = replace_walk(hook, &k, v);
                    (k, replaced)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| replace_walk(hook, &i.to_string(), v))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorObject;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    /// Serializes as `{"$class":"counter","count":N}`
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "$class", rename = "counter")]
    struct Counter {
        count: i64,
    }

    // {$class, $props:{..}} -> {$class, ..}
    fn counter_reviver() -> Hook {
        Arc::new(|_key, value| match value {
            Value::Object(mut map) if map.contains_key("$class") && map.contains_key("$props") => {
                if let Some(Value::Object(props)) = map.remove("$props") {
                    map.extend(props);
                }
                Value::Object(map)
            }
            other => other,
        })
    }

    // {$class, ..} -> {$class, $props:{..}}
    fn counter_replacer() -> Hook {
        Arc::new(|_key, value| match value {
            Value::Object(mut map) if map.contains_key("$class") && !map.contains_key("$props") => {
                let class = map.remove("$class").unwrap_or(Value::Null);
                let mut wrapped = Map::new();
                wrapped.insert("$class".to_string(), class);
                wrapped.insert("$props".to_string(), Value::Object(map));
                Value::Object(wrapped)
            }
            other => other,
        })
    }

    #[test]
    fn test_decode_single_and_batch() {
        let codec = Codec::default();
        assert!(matches!(codec.decode(r#"{"a":1}"#).unwrap(), Message::Single(_)));
        assert!(codec.decode("[1,2]").unwrap().is_batch());
        assert!(codec.decode("[]").unwrap().is_batch());
    }

    #[test]
    fn test_decode_invalid_json() {
        let codec = Codec::default();
        let err = codec.decode(r#"{"jsonrpc": "2.0", "method": "test""#).unwrap_err();
        assert!(matches!(err, CodecError::Parse(_)));
        assert_eq!(err.to_error_object().code, -32700);
    }

    #[test]
    fn test_counter_round_trip() {
        let codec = Codec::new(Version::V2)
            .with_reviver(counter_reviver())
            .with_replacer(counter_replacer());

        let original = Counter { count: 3 };
        let response = Response::success(json!(1), serde_json::to_value(&original).unwrap());
        let text = codec.encode_reply(&Reply::Single(response.clone())).unwrap();
        let wire: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(wire["result"], json!({"$class": "counter", "$props": {"count": 3}}));

        let decoded = codec.decode_value(&text).unwrap();
        let parsed = Response::from_value(&decoded, Version::V2).unwrap();
        assert_eq!(parsed, response);

        let revived: Counter = serde_json::from_value(parsed.into_result().unwrap()).unwrap();
        assert_eq!(revived.count, 3);
        assert_eq!(revived, original);
    }

    #[test]
    fn test_reviver_sees_children_before_parent() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = seen.clone();
        let codec = Codec::default().with_reviver(Arc::new(move |key, value| {
            log.lock().unwrap().push(key.to_string());
            value
        }));
        codec.decode_value(r#"{"a":{"b":1}}"#).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["b", "a", ""]);
    }

    #[test]
    fn test_error_responses_round_trip() {
        let codec = Codec::new(Version::V1);
        let reply = Reply::Batch(vec![
            Response::error(json!(2), ErrorObject::invalid_params("b")),
            Response::success(json!(3), json!([1])),
        ]);
        let text = codec.encode_reply(&reply).unwrap();
        let Message::Batch(items) = codec.decode(&text).unwrap() else {
            panic!("expected batch");
        };
        let decoded: Vec<Response> = items
            .iter()
            .map(|v| Response::from_value(v, Version::V1).unwrap())
            .collect();
        assert_eq!(Reply::Batch(decoded), reply);
    }

    #[test]
    fn test_latin1_bytes() {
        let codec = Codec::default().with_encoding(Encoding::Latin1);
        let bytes = codec.text_to_bytes(r#"{"name":"café"}"#).unwrap();
        assert_eq!(codec.bytes_to_text(&bytes).unwrap(), r#"{"name":"café"}"#);
        assert!(codec.text_to_bytes("€").is_err());
        assert!(Codec::default().bytes_to_text(&[0xff, 0xfe]).is_err());
    }
}
