//! Dispatch engine
//!
//! Turns one decoded message into at most one reply:
//!
//! 1. undecodable input answers PARSE_ERROR with a null id
//! 2. arrays go to the batch path (2.0 only)
//! 3. invalid requests answer INVALID_REQUEST with a null id
//! 4. the router resolves the method, or the call answers METHOD_NOT_FOUND
//! 5. the definition runs (local handler or relay)
//! 6. notifications are answered with nothing

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tandem_json_rpc::{
    Codec, Encoding, ErrorObject, Hook, Message, Reply, Request, Response, Version,
};
use tandem_rpc_client::Client;
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::config::ServerConfig;
use crate::error::RegistryError;
use crate::events::{EventBus, ServerEvent};
use crate::local::LocalTransport;
use crate::method::{Method, MethodOptions, ParamSpec};
use crate::registry::{Definition, RESERVED_PREFIX, Registry};
use crate::router::{RegistryRouter, Router};
use crate::{batch, relay};

struct ServerInner {
    config: ServerConfig,
    codec: Codec,
    registry: Registry,
    router: Arc<dyn Router>,
    events: EventBus,
}

/// JSON-RPC server. Cheap to clone; clones share registry, router and events.
#[derive(Clone)]
pub struct Server {
    inner: Arc<ServerInner>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// JSON-RPC 2.0 server with default options and registry routing
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn version(&self) -> Version {
        self.inner.config.version
    }

    pub fn codec(&self) -> &Codec {
        &self.inner.codec
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Options bare handlers are wrapped with
    pub fn default_options(&self) -> MethodOptions {
        self.inner.config.method_options()
    }

    /// Register a definition under `name`, replacing any previous one.
    ///
    /// Bare handlers are wrapped with the server's default options here.
    pub fn register(
        &self,
        name: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> Result<(), RegistryError> {
        let definition = self.bind(definition.into());
        if let Some(previous) = self.inner.registry.register(name, definition)? {
            debug!(kind = previous.kind(), "Replaced existing method");
        }
        Ok(())
    }

    pub fn remove(&self, name: &str) -> bool {
        self.inner.registry.remove(name).is_some()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.inner.registry.has(name)
    }

    pub fn method_names(&self) -> Vec<String> {
        self.inner.registry.names()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.inner.events.subscribe()
    }

    /// Client that dispatches straight into this server
    pub fn local_client(&self) -> Client {
        Client::builder(LocalTransport::new(self.clone()))
            .version(self.version())
            .build()
    }

    /// Handle one raw text message. `None` means nothing should be sent back.
    pub async fn handle_str(&self, text: &str) -> Option<String> {
        let reply = match self.inner.codec.decode(text) {
            Ok(message) => self.dispatch_message(message).await?,
            Err(e) => {
                debug!(error = %e, "Rejecting undecodable message");
                Reply::Single(Response::error(Value::Null, e.to_error_object()))
            }
        };
        Some(self.encode(&reply))
    }

    /// Handle one raw byte message using the configured charset
    pub async fn handle_bytes(&self, bytes: &[u8]) -> Option<Vec<u8>> {
        let reply = match self.inner.codec.decode_bytes(bytes) {
            Ok(message) => self.dispatch_message(message).await?,
            Err(e) => {
                debug!(error = %e, "Rejecting undecodable message");
                Reply::Single(Response::error(Value::Null, e.to_error_object()))
            }
        };
        let text = self.encode(&reply);
        match self.inner.codec.text_to_bytes(&text) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(error = %e, "Reply not representable in the configured charset");
                Some(self.internal_failure().into_bytes())
            }
        }
    }

    /// Dispatch an already-decoded message
    pub async fn dispatch(&self, message: Value) -> Option<Reply> {
        self.dispatch_message(Message::from_value(message)).await
    }

    /// Dispatch a typed request. Notifications yield `None`.
    pub async fn call(&self, request: Request) -> Option<Response> {
        self.dispatch_one(request.to_value()).await
    }

    async fn dispatch_message(&self, message: Message) -> Option<Reply> {
        match message {
            Message::Single(value) => self.dispatch_one(value).await.map(Reply::Single),
            Message::Batch(items) => batch::dispatch(self, items).await,
        }
    }

    /// Validate, route and execute a single request
    pub(crate) async fn dispatch_one(&self, value: Value) -> Option<Response> {
        let raw = value.clone();
        let request = match Request::from_value(value, self.version()) {
            Ok(request) => request,
            Err(error) => {
                debug!(request = %raw, "Rejecting invalid request");
                return Some(Response::error(Value::Null, error));
            }
        };
        self.inner.events.emit(ServerEvent::Request(raw.clone()));

        let response = self.execute(&request).await;
        let response = if request.is_notification() {
            if let Some(error) = response.error_object() {
                debug!(method = %request.method, code = error.code, "Notification failed");
            }
            None
        } else {
            Some(response)
        };

        self.inner.events.emit(ServerEvent::Response {
            request: raw,
            response: response.as_ref().map(|r| r.to_value(self.version())),
        });
        response
    }

    async fn execute(&self, request: &Request) -> Response {
        let id = request.response_id();
        if request.method.starts_with(RESERVED_PREFIX) {
            debug!(method = %request.method, "Reserved method name");
            return Response::error(id, ErrorObject::method_not_found(&request.method));
        }

        let Some(definition) = self
            .inner
            .router
            .route(self, &request.method, request.params.as_ref())
        else {
            debug!(method = %request.method, "Method not found");
            return Response::error(id, ErrorObject::method_not_found(&request.method));
        };

        debug!(method = %request.method, kind = definition.kind(), "Dispatching request");
        let params = request.params.clone();
        let outcome = match definition {
            Definition::Method(method) => method.execute(self, params).await,
            Definition::Handler(handler) => {
                Method::new(handler, self.default_options()).execute(self, params).await
            }
            Definition::Relay(client) => relay::forward(&client, request).await,
        };
        match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::error(id, error),
        }
    }

    fn bind(&self, definition: Definition) -> Definition {
        match definition {
            Definition::Handler(handler) => {
                Method::new(handler, self.default_options()).into()
            }
            other => other,
        }
    }

    fn encode(&self, reply: &Reply) -> String {
        match self.inner.codec.encode_reply(reply) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode reply");
                self.internal_failure()
            }
        }
    }

    /// Hook-free rendering of a null-id INTERNAL_ERROR, for when encoding itself failed
    fn internal_failure(&self) -> String {
        let response = Response::error(
            Value::Null,
            ErrorObject::internal_error(Some("failed to encode reply".to_string())),
        );
        response.to_value(self.version()).to_string()
    }
}

/// Builder for [`Server`]
pub struct ServerBuilder {
    config: ServerConfig,
    router: Option<Arc<dyn Router>>,
    reviver: Option<Hook>,
    replacer: Option<Hook>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            router: None,
            reviver: None,
            replacer: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Default `collect` flag for bare handlers
    pub fn collect(mut self, collect: bool) -> Self {
        self.config.collect = collect;
        self
    }

    /// Default parameter shape for bare handlers
    pub fn params(mut self, params: ParamSpec) -> Self {
        self.config.params = Some(params);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Replace registry lookup with a custom router
    pub fn router<R: Router + 'static>(mut self, router: R) -> Self {
        self.router = Some(Arc::new(router));
        self
    }

    /// Closure form of [`router`](Self::router)
    pub fn route_with<F>(self, route: F) -> Self
    where
        F: Fn(&Server, &str, Option<&tandem_json_rpc::Params>) -> Option<Definition>
            + Send
            + Sync
            + 'static,
    {
        self.router(route)
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

    pub fn build(self) -> Server {
        let mut codec = Codec::new(self.config.version).with_encoding(self.config.encoding);
        if let Some(reviver) = self.reviver {
            codec = codec.with_reviver(reviver);
        }
        if let Some(replacer) = self.replacer {
            codec = codec.with_replacer(replacer);
        }
        let events = EventBus::new(self.config.event_capacity);
        let router = self.router.unwrap_or_else(|| Arc::new(RegistryRouter));
        Server {
            inner: Arc::new(ServerInner {
                config: self.config,
                codec,
                registry: Registry::new(),
                router,
                events,
            }),
        }
    }
}
