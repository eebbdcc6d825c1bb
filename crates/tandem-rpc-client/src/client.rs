//! Main client implementation

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use tandem_json_rpc::{
    Codec, Encoding, ErrorObject, Hook, Message, Params, Request, RequestId, Response, Version,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::pending::PendingRequests;
use crate::transport::{BoxedTransport, Transport, TransportStatistics};

/// Produces ids for requests built without an explicit one
pub type IdGenerator = Arc<dyn Fn() -> RequestId + Send + Sync>;

/// How the id of a built request is chosen
#[derive(Debug, Clone, PartialEq)]
pub enum IdSpec {
    /// Ask the generator for a fresh id
    Generate,
    /// Explicit null id: no response is expected
    Notification,
    /// Use this id verbatim
    Id(Value),
}

impl From<RequestId> for IdSpec {
    fn from(id: RequestId) -> Self {
        IdSpec::Id(id.into())
    }
}

/// Random opaque token, the default id generator
pub fn uuid_generator() -> IdGenerator {
    Arc::new(|| RequestId::String(uuid::Uuid::new_v4().to_string()))
}

/// The answer to a batch, split by outcome.
///
/// Both partitions keep the relative order of the wire response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    pub errors: Vec<Response>,
    pub results: Vec<Response>,
}

impl BatchResponse {
    pub fn error_for(&self, id: &Value) -> Option<&ErrorObject> {
        self.errors
            .iter()
            .find(|r| &r.id == id)
            .and_then(Response::error_object)
    }

    pub fn result_for(&self, id: &Value) -> Option<&Value> {
        self.results
            .iter()
            .find(|r| &r.id == id)
            .and_then(Response::result)
    }

    pub fn len(&self) -> usize {
        self.errors.len() + self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSON-RPC client bound to one transport
#[derive(Clone)]
pub struct Client {
    /// Transport layer
    transport: BoxedTransport,
    /// Wire codec (version, charset, hooks)
    codec: Codec,
    /// Configuration
    config: ClientConfig,
    generator: IdGenerator,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.transport_type())
            .field("codec", &self.codec)
            .field("config", &self.config)
            .finish()
    }
}

impl Client {
    pub fn builder<T: Transport + 'static>(transport: T) -> ClientBuilder {
        ClientBuilder::new(Arc::new(transport))
    }

    /// Create a client with default configuration
    pub fn new(transport: BoxedTransport) -> Self {
        ClientBuilder::new(transport).build()
    }

    pub fn version(&self) -> Version {
        self.config.version
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport_statistics(&self) -> TransportStatistics {
        self.transport.statistics()
    }

    /// Build a well-formed request.
    ///
    /// `params` must be an array, an object or null (omitted). V1 requests only
    /// accept positional params.
    pub fn build_request(
        &self,
        method: impl Into<String>,
        params: Value,
        id: IdSpec,
    ) -> ClientResult<Request> {
        let method = method.into();
        if method.is_empty() {
            return Err(ClientError::invalid_request("method name must not be empty"));
        }

        let params = match params {
            Value::Null => None,
            other => Some(Params::from_value(other).ok_or_else(|| {
                ClientError::invalid_request("params must be an array or an object")
            })?),
        };
        if self.version() == Version::V1 && matches!(params, Some(Params::Named(_))) {
            return Err(ClientError::invalid_request(
                "JSON-RPC 1.0 requests only carry positional params",
            ));
        }

        let id = match id {
            IdSpec::Generate => Value::from((self.generator)()),
            IdSpec::Notification => Value::Null,
            IdSpec::Id(id) => {
                let valid = match self.version() {
                    Version::V1 => true,
                    Version::V2 => matches!(id, Value::Null | Value::String(_) | Value::Number(_)),
                };
                if !valid {
                    return Err(ClientError::invalid_request(
                        "request id must be a string, a number or null",
                    ));
                }
                id
            }
        };

        Ok(Request::new(self.version(), method, params, Some(id)))
    }

    /// Send one request, plain completion: the whole response as received.
    ///
    /// `Ok(None)` means the server accepted the payload without answering.
    pub async fn send(&self, request: &Request) -> ClientResult<Option<Response>> {
        let payload = self
            .codec
            .encode_value(&request.to_value_with(self.config.notification_id_null))?;
        debug!(method = %request.method, notification = request.is_notification(), "Sending JSON-RPC request");

        let Some(text) = self.transmit(payload).await? else {
            return Ok(None);
        };
        match self.codec.decode(&text)? {
            Message::Single(value) => Response::from_value(&value, self.version())
                .map(Some)
                .ok_or_else(|| ClientError::invalid_response(text)),
            Message::Batch(_) => Err(ClientError::invalid_response(
                "batch answer to a single request",
            )),
        }
    }

    /// Send one request, split completion: JSON-RPC error apart from result
    pub async fn send_split(
        &self,
        request: &Request,
    ) -> ClientResult<Option<Result<Value, ErrorObject>>> {
        Ok(self.send(request).await?.map(Response::into_result))
    }

    /// Build and send a call with a generated id
    pub async fn request(
        &self,
        method: impl Into<String>,
        params: Value,
    ) -> ClientResult<Result<Value, ErrorObject>> {
        let request = self.build_request(method, params, IdSpec::Generate)?;
        self.send_split(&request)
            .await?
            .ok_or_else(|| ClientError::invalid_response("empty answer to a call"))
    }

    /// Build and send a notification
    pub async fn notify(&self, method: impl Into<String>, params: Value) -> ClientResult<()> {
        let request = self.build_request(method, params, IdSpec::Notification)?;
        if let Some(response) = self.send(&request).await? {
            debug!(id = %response.id, "Server answered a notification, ignoring");
        }
        Ok(())
    }

    /// Re-issue a call received elsewhere with its method, params and id unchanged
    pub async fn forward(
        &self,
        method: &str,
        params: Option<Params>,
        id: Option<Value>,
    ) -> ClientResult<Option<Response>> {
        let id = id.unwrap_or(Value::Null);
        let request = Request::new(self.version(), method, params, Some(id));
        self.send(&request).await
    }

    /// Send a batch and split the answer into errors and results.
    ///
    /// Responses are matched against this batch's own pending table; answers
    /// for ids that were never sent (or were already answered) are dropped, as
    /// are items that are not responses at all. Error responses with a null id
    /// cannot be correlated and are kept as-is.
    pub async fn send_batch(&self, requests: &[Request]) -> ClientResult<Option<BatchResponse>> {
        let ids: Vec<Value> = requests
            .iter()
            .filter(|r| !r.is_notification())
            .map(Request::response_id)
            .collect();
        let mut pending = PendingRequests::with_ids(&ids);

        let batch = Value::Array(
            requests
                .iter()
                .map(|r| r.to_value_with(self.config.notification_id_null))
                .collect(),
        );
        let payload = self.codec.encode_value(&batch)?;
        debug!(size = requests.len(), "Sending JSON-RPC batch");

        let Some(text) = self.transmit(payload).await? else {
            return Ok(None);
        };
        let items = match self.codec.decode(&text)? {
            Message::Batch(items) => items,
            // e.g. a lone INVALID_REQUEST for an empty batch
            Message::Single(value) => vec![value],
        };

        let mut split = BatchResponse::default();
        for item in items {
            let Some(response) = Response::from_value(&item, self.version()) else {
                warn!(item = %item, "Ignoring malformed item in batch answer");
                continue;
            };
            let accepted = response.id.is_null() || pending.complete(&response);
            if !accepted {
                continue;
            }
            if response.is_error() {
                split.errors.push(response);
            } else {
                split.results.push(response);
            }
        }
        Ok(Some(split))
    }

    async fn transmit(&self, payload: String) -> ClientResult<Option<String>> {
        let outcome = match self.config.timeouts.request {
            Some(limit) => match timeout(limit, self.exchange(payload)).await {
                Ok(outcome) => outcome?,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Transport did not answer in time");
                    return Err(ClientError::Timeout);
                }
            },
            None => self.exchange(payload).await?,
        };
        Ok(outcome.filter(|text| !text.trim().is_empty()))
    }

    /// One round trip, through the byte path when the transport carries bytes
    async fn exchange(&self, payload: String) -> ClientResult<Option<String>> {
        if !self.transport.carries_bytes() {
            return Ok(self.transport.send(payload).await?);
        }
        let bytes = self.codec.text_to_bytes(&payload)?;
        match self.transport.send_bytes(bytes).await? {
            Some(answer) => Ok(Some(self.codec.bytes_to_text(&answer)?)),
            None => Ok(None),
        }
    }
}

/// Builder for [`Client`]
pub struct ClientBuilder {
    transport: BoxedTransport,
    config: ClientConfig,
    generator: IdGenerator,
    reviver: Option<Hook>,
    replacer: Option<Hook>,
}

impl ClientBuilder {
    pub fn new(transport: BoxedTransport) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
            generator: uuid_generator(),
            reviver: None,
            replacer: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Charset for transports that carry bytes
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn request_timeout(mut self, limit: Duration) -> Self {
        self.config.timeouts.request = Some(limit);
        self
    }

    pub fn generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> RequestId + Send + Sync + 'static,
    {
        self.generator = Arc::new(generator);
        self
    }

    pub fn reviver<F>(mut self, reviver: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.reviver = Some(Arc::new(reviver));
        self
    }

    pub fn replacer<F>(mut self, replacer: F) -> Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.replacer = Some(Arc::new(replacer));
        self
    }

    pub fn build(self) -> Client {
        let mut codec = Codec::new(self.config.version).with_encoding(self.config.encoding);
        if let Some(reviver) = self.reviver {
            codec = codec.with_reviver(reviver);
        }
        if let Some(replacer) = self.replacer {
            codec = codec.with_replacer(replacer);
        }
        Client {
            transport: self.transport,
            codec,
            config: self.config,
            generator: self.generator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::FnTransport;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Answers every payload with a fixed string (or silence)
    fn canned(answer: Option<&'static str>) -> FnTransport {
        FnTransport::new(move |_payload: String| {
            async move { Ok(answer.map(str::to_string)) }.boxed()
        })
    }

    /// Echoes back a success for every id it sees, in reverse order for batches
    fn echo_results() -> FnTransport {
        FnTransport::new(|payload: String| {
            async move {
                let value: Value = serde_json::from_str(&payload).unwrap();
                let answer = |req: &Value| {
                    json!({"jsonrpc": "2.0", "id": req["id"], "result": req["method"]})
                };
                let out = match value {
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .filter(|r| !r["id"].is_null())
                            .rev()
                            .map(answer)
                            .collect(),
                    ),
                    single => answer(&single),
                };
                Ok(Some(out.to_string()))
            }
            .boxed()
        })
    }

    #[test]
    fn test_generated_id_is_never_null() {
        let client = Client::builder(canned(None)).build();
        let request = client.build_request("add", json!([1, 2]), IdSpec::Generate).unwrap();
        let id = request.id.clone().unwrap();
        assert!(id.is_string());
        assert!(!request.is_notification());
    }

    #[test]
    fn test_custom_generator() {
        let counter = Arc::new(AtomicI64::new(0));
        let next = counter.clone();
        let client = Client::builder(canned(None))
            .generator(move || RequestId::Number(next.fetch_add(1, Ordering::SeqCst) + 1))
            .build();
        let first = client.build_request("a", Value::Null, IdSpec::Generate).unwrap();
        let second = client.build_request("a", Value::Null, IdSpec::Generate).unwrap();
        assert_eq!(first.id, Some(json!(1)));
        assert_eq!(second.id, Some(json!(2)));
    }

    #[test]
    fn test_build_request_rejects_bad_params() {
        let client = Client::builder(canned(None)).build();
        assert!(matches!(
            client.build_request("a", json!(5), IdSpec::Generate),
            Err(ClientError::InvalidRequest(_))
        ));
        assert!(client.build_request("", json!([]), IdSpec::Generate).is_err());
        assert!(client.build_request("a", json!([]), IdSpec::Id(json!([1]))).is_err());

        let v1 = Client::builder(canned(None)).version(Version::V1).build();
        assert!(v1.build_request("a", json!({"x": 1}), IdSpec::Generate).is_err());
    }

    #[test]
    fn test_null_id_marks_notification() {
        let client = Client::builder(canned(None)).build();
        let request = client.build_request("log", json!(["x"]), IdSpec::Notification).unwrap();
        assert!(request.is_notification());
        assert_eq!(request.to_value(), json!({"jsonrpc": "2.0", "method": "log", "params": ["x"]}));
    }

    #[tokio::test]
    async fn test_plain_and_split_completion() {
        let client = Client::builder(echo_results()).build();
        let request = client.build_request("ping", Value::Null, IdSpec::Id(json!(9))).unwrap();

        let response = client.send(&request).await.unwrap().unwrap();
        assert_eq!(response.id, json!(9));
        assert_eq!(response.result(), Some(&json!("ping")));

        let split = client.send_split(&request).await.unwrap().unwrap();
        assert_eq!(split.unwrap(), json!("ping"));
    }

    #[tokio::test]
    async fn test_split_completion_separates_rpc_error() {
        let client = Client::builder(canned(Some(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )))
        .build();
        let request = client.build_request("nope", Value::Null, IdSpec::Id(json!(1))).unwrap();
        let err = client.send_split(&request).await.unwrap().unwrap().unwrap_err();
        assert_eq!(err.code, -32601);
    }

    #[tokio::test]
    async fn test_empty_answer_means_accepted() {
        let client = Client::builder(canned(Some(""))).build();
        let request = client.build_request("log", Value::Null, IdSpec::Notification).unwrap();
        assert!(client.send(&request).await.unwrap().is_none());
        client.notify("log", json!([1])).await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_error_short_circuits() {
        let transport = FnTransport::new(|_payload: String| {
            async { Err(TransportError::ConnectionFailed("refused".to_string())) }.boxed()
        });
        let client = Client::builder(transport).build();
        let err = client.request("add", json!([1, 2])).await.unwrap_err();
        assert!(err.is_transport_error());
        assert!(matches!(err, ClientError::Transport(TransportError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_response_is_reported() {
        let client = Client::builder(canned(Some(r#"{"hello":"world"}"#))).build();
        let err = client.request("a", Value::Null).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));

        let garbled = Client::builder(canned(Some("{not json"))).build();
        assert!(matches!(
            garbled.request("a", Value::Null).await.unwrap_err(),
            ClientError::Codec(_)
        ));
    }

    #[tokio::test]
    async fn test_batch_timeout_is_reported() {
        let transport = FnTransport::new(|_payload: String| {
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Some("[]".to_string()))
            }
            .boxed()
        });
        let client = Client::builder(transport)
            .request_timeout(Duration::from_millis(20))
            .build();
        let batch = vec![
            client.build_request("a", Value::Null, IdSpec::Id(json!(1))).unwrap(),
            client.build_request("b", Value::Null, IdSpec::Id(json!(2))).unwrap(),
        ];

        let err = client.send_batch(&batch).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_batch_split_preserves_response_order() {
        let client = Client::builder(echo_results()).build();
        let batch = vec![
            client.build_request("first", Value::Null, IdSpec::Id(json!(1))).unwrap(),
            client.build_request("quiet", Value::Null, IdSpec::Notification).unwrap(),
            client.build_request("second", Value::Null, IdSpec::Id(json!(2))).unwrap(),
        ];

        let split = client.send_batch(&batch).await.unwrap().unwrap();
        assert!(split.errors.is_empty());
        let ids: Vec<_> = split.results.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![json!(2), json!(1)]);
        assert_eq!(split.result_for(&json!(1)), Some(&json!("first")));
    }

    #[tokio::test]
    async fn test_batch_drops_unknown_ids_and_keeps_null_id_errors() {
        let client = Client::builder(canned(Some(
            r#"[
                {"jsonrpc":"2.0","id":1,"result":10},
                {"jsonrpc":"2.0","id":77,"result":"stray"},
                {"jsonrpc":"2.0","id":1,"result":"duplicate"},
                {"jsonrpc":"2.0","id":null,"error":{"code":-32600,"message":"Invalid request"}}
            ]"#,
        )))
        .build();
        let batch = vec![client.build_request("a", Value::Null, IdSpec::Id(json!(1))).unwrap()];

        let split = client.send_batch(&batch).await.unwrap().unwrap();
        assert_eq!(split.results.len(), 1);
        assert_eq!(split.result_for(&json!(1)), Some(&json!(10)));
        assert_eq!(split.errors.len(), 1);
        assert_eq!(split.error_for(&Value::Null).unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_batch_skips_malformed_items() {
        let client = Client::builder(canned(Some(
            r#"[
                {"jsonrpc":"2.0","id":1,"result":"one"},
                {"hello":"world"},
                {"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method not found"}}
            ]"#,
        )))
        .build();
        let batch = vec![
            client.build_request("a", Value::Null, IdSpec::Id(json!(1))).unwrap(),
            client.build_request("b", Value::Null, IdSpec::Id(json!(2))).unwrap(),
        ];

        let split = client.send_batch(&batch).await.unwrap().unwrap();
        assert_eq!(split.result_for(&json!(1)), Some(&json!("one")));
        assert_eq!(split.error_for(&json!(2)).unwrap().code, -32601);
        assert_eq!(split.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_batches_with_same_ids() {
        // answers arrive in the opposite order the batches were sent
        let transport = FnTransport::new(|payload: String| {
            async move {
                let items: Vec<Value> = serde_json::from_str(&payload).unwrap();
                let method = items[0]["method"].as_str().unwrap().to_string();
                let delay = if method == "slow" { 30 } else { 5 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(Some(json!([{"jsonrpc": "2.0", "id": 1, "result": method}]).to_string()))
            }
            .boxed()
        });
        let client = Client::builder(transport).build();
        let slow = vec![client.build_request("slow", Value::Null, IdSpec::Id(json!(1))).unwrap()];
        let fast = vec![client.build_request("fast", Value::Null, IdSpec::Id(json!(1))).unwrap()];

        let (slow, fast) = tokio::join!(client.send_batch(&slow), client.send_batch(&fast));
        let (slow, fast) = (slow.unwrap().unwrap(), fast.unwrap().unwrap());
        assert_eq!(slow.result_for(&json!(1)), Some(&json!("slow")));
        assert_eq!(fast.result_for(&json!(1)), Some(&json!("fast")));
    }

    /// Byte-level transport that records what it was handed
    struct ByteTransport {
        sent: Arc<parking_lot::Mutex<Vec<u8>>>,
        answer: Vec<u8>,
    }

    #[async_trait::async_trait]
    impl Transport for ByteTransport {
        fn transport_type(&self) -> crate::transport::TransportType {
            crate::transport::TransportType::Tcp
        }

        async fn send(&self, _payload: String) -> Result<Option<String>, TransportError> {
            Err(TransportError::Unsupported("text".to_string()))
        }

        fn carries_bytes(&self) -> bool {
            true
        }

        async fn send_bytes(&self, payload: Vec<u8>) -> Result<Option<Vec<u8>>, TransportError> {
            *self.sent.lock() = payload;
            Ok(Some(self.answer.clone()))
        }
    }

    #[tokio::test]
    async fn test_byte_transport_uses_configured_charset() {
        let mut answer = br#"{"jsonrpc":"2.0","id":1,"result":""#.to_vec();
        answer.push(0xE9);
        answer.extend_from_slice(br#""}"#);
        let sent = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let client = Client::builder(ByteTransport { sent: sent.clone(), answer })
            .encoding(Encoding::Latin1)
            .build();

        let request = client.build_request("echo", json!(["\u{e9}"]), IdSpec::Id(json!(1))).unwrap();
        let response = client.send(&request).await.unwrap().unwrap();
        assert_eq!(response.result(), Some(&json!("\u{e9}")));

        let sent = sent.lock();
        assert!(sent.contains(&0xE9));
        assert!(!sent.windows(2).any(|pair| pair == [0xC3, 0xA9]));
    }

    #[tokio::test]
    async fn test_all_notification_batch_gets_no_answer() {
        let client = Client::builder(canned(None)).build();
        let batch = vec![client.build_request("a", Value::Null, IdSpec::Notification).unwrap()];
        assert!(client.send_batch(&batch).await.unwrap().is_none());
    }

    #[test]
    fn test_blocking_send_with_tokio_test() {
        let client = Client::builder(echo_results()).build();
        let result = tokio_test::block_on(client.request("echo", json!([]))).unwrap();
        assert_eq!(result.unwrap(), json!("echo"));
    }
}
