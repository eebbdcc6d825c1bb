//! Method wrapper: parameter shaping and handler settlement
//!
//! A handler settles its call in one of two ways. It either answers through the
//! [`Responder`] it was handed and returns [`Handled::Pending`], or it returns
//! [`Handled::Deferred`] with a future that resolves to the outcome. A handler
//! may do both; whichever outcome is available first is used and the other is
//! ignored.

use futures::FutureExt;
use futures::future::{self, BoxFuture, Either};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tandem_json_rpc::{ErrorObject, Params};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::error::HandlerError;
use crate::server::Server;

/// What a handler eventually produces
pub type Outcome = Result<Value, HandlerError>;

/// Future returned by deferred handlers
pub type HandlerFuture = BoxFuture<'static, Outcome>;

/// Type-erased handler, invoked with the dispatching server as context
pub type Handler = Arc<dyn Fn(Server, Params, Responder) -> Handled + Send + Sync>;

/// How a handler will settle its call
pub enum Handled {
    /// The outcome arrives through the [`Responder`]
    Pending,
    /// The outcome is this future's output
    Deferred(HandlerFuture),
}

impl fmt::Debug for Handled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handled::Pending => f.write_str("Pending"),
            Handled::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// One-shot answer channel handed to every handler invocation.
///
/// Cloneable; only the first `send` across all clones is delivered.
#[derive(Clone)]
pub struct Responder {
    slot: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Responder {
    fn channel() -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        let responder = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (responder, rx)
    }

    /// Settle the call. Returns false if it was already settled.
    pub fn send(&self, outcome: Outcome) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            warn!("Handler settled more than once, later outcome ignored");
            return false;
        };
        if tx.send(outcome).is_err() {
            warn!("Handler settled after its call completed, outcome ignored");
            return false;
        }
        true
    }

    pub fn ok(&self, result: Value) -> bool {
        self.send(Ok(result))
    }

    pub fn err(&self, error: impl Into<HandlerError>) -> bool {
        self.send(Err(error.into()))
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Declared parameter shape of a method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSpec {
    /// Parameter names in call order
    Ordered(Vec<String>),
    /// Parameter names in call order, each with an optional default
    Named(Vec<(String, Option<Value>)>),
}

impl ParamSpec {
    pub fn ordered<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParamSpec::Ordered(names.into_iter().map(Into::into).collect())
    }

    /// Every name gets a default
    pub fn named<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        ParamSpec::Named(
            defaults
                .into_iter()
                .map(|(name, default)| (name.into(), Some(default)))
                .collect(),
        )
    }

    pub fn names(&self) -> Vec<String> {
        match self {
            ParamSpec::Ordered(names) => names.clone(),
            ParamSpec::Named(decls) => decls.iter().map(|(name, _)| name.clone()).collect(),
        }
    }

    fn declarations(&self) -> Vec<(String, Option<Value>)> {
        match self {
            ParamSpec::Ordered(names) => names.iter().map(|n| (n.clone(), None)).collect(),
            ParamSpec::Named(decls) => decls.clone(),
        }
    }
}

/// Per-method dispatch options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodOptions {
    /// Hand the handler the params container itself instead of spreading it
    pub collect: bool,
    /// Declared parameter shape
    pub params: Option<ParamSpec>,
}

impl Default for MethodOptions {
    fn default() -> Self {
        Self {
            collect: true,
            params: None,
        }
    }
}

impl MethodOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collect(mut self, collect: bool) -> Self {
        self.collect = collect;
        self
    }

    pub fn with_params(mut self, params: ParamSpec) -> Self {
        self.params = Some(params);
        self
    }
}

/// Wrap an async closure as a deferred handler
pub fn async_handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Arc::new(move |_server: Server, params: Params, _responder: Responder| {
        Handled::Deferred(f(params).boxed())
    })
}

/// Wrap a synchronous closure as a handler that answers immediately
pub fn sync_handler<F>(f: F) -> Handler
where
    F: Fn(Params) -> Outcome + Send + Sync + 'static,
{
    Arc::new(move |_server: Server, params: Params, responder: Responder| {
        responder.send(f(params));
        Handled::Pending
    })
}

/// A handler together with its dispatch options
#[derive(Clone)]
pub struct Method {
    handler: Handler,
    options: MethodOptions,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Method {
    pub fn new(handler: Handler, options: MethodOptions) -> Self {
        Self { handler, options }
    }

    pub fn from_async<F, Fut>(f: F, options: MethodOptions) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::new(async_handler(f), options)
    }

    pub fn from_fn<F>(f: F, options: MethodOptions) -> Self
    where
        F: Fn(Params) -> Outcome + Send + Sync + 'static,
    {
        Self::new(sync_handler(f), options)
    }

    /// Full-control handler: receives the server and the responder
    pub fn with_responder<F>(f: F, options: MethodOptions) -> Self
    where
        F: Fn(Server, Params, Responder) -> Handled + Send + Sync + 'static,
    {
        Self::new(Arc::new(f), options)
    }

    pub fn options(&self) -> &MethodOptions {
        &self.options
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Shape `params`, invoke the handler and wait for it to settle.
    ///
    /// Shaping failures become INVALID_PARAMS without invoking the handler.
    /// Panics and faults become INTERNAL_ERROR.
    pub async fn execute(&self, server: &Server, params: Option<Params>) -> Result<Value, ErrorObject> {
        let args = self.shape(params)?;
        let (responder, replied) = Responder::channel();

        let invoked = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.handler)(server.clone(), args, responder)
        }));
        let outcome = match invoked {
            Err(payload) => Err(panicked(payload)),
            Ok(Handled::Pending) => replied.await.unwrap_or_else(|_| {
                Err(HandlerError::fault("Handler dropped its responder without settling"))
            }),
            Ok(Handled::Deferred(future)) => settle(replied, future).await,
        };
        outcome.map_err(HandlerError::into_error_object)
    }

    fn shape(&self, params: Option<Params>) -> Result<Params, ErrorObject> {
        if self.options.collect {
            Ok(self.collect_args(params))
        } else {
            self.spread_args(params).map(Params::Positional)
        }
    }

    fn collect_args(&self, params: Option<Params>) -> Params {
        match (&self.options.params, params) {
            (Some(ParamSpec::Named(decls)), params) => {
                let mut merged: Map<String, Value> = decls
                    .iter()
                    .filter_map(|(name, default)| Some((name.clone(), default.clone()?)))
                    .collect();
                if let Some(params) = params {
                    let names: Vec<String> = decls.iter().map(|(name, _)| name.clone()).collect();
                    merged.extend(params.into_named(&names));
                }
                Params::Named(merged)
            }
            (Some(ParamSpec::Ordered(names)), Some(params)) => {
                Params::Positional(params.into_ordered(names))
            }
            (_, Some(params)) => params,
            (_, None) => Params::Positional(Vec::new()),
        }
    }

    fn spread_args(&self, params: Option<Params>) -> Result<Vec<Value>, ErrorObject> {
        let decls = self
            .options
            .params
            .as_ref()
            .map(ParamSpec::declarations)
            .unwrap_or_default();

        match params.unwrap_or(Params::Positional(Vec::new())) {
            Params::Positional(items) if decls.is_empty() => Ok(items),
            Params::Positional(mut items) => {
                if items.len() > decls.len() {
                    return Err(ErrorObject::invalid_params(&format!(
                        "expected at most {} arguments, got {}",
                        decls.len(),
                        items.len()
                    )));
                }
                for (name, default) in decls.into_iter().skip(items.len()) {
                    items.push(default.ok_or_else(|| missing(&name))?);
                }
                Ok(items)
            }
            Params::Named(_) if decls.is_empty() => Err(ErrorObject::invalid_params(
                "named parameters need declared parameter names",
            )),
            Params::Named(mut map) => decls
                .into_iter()
                .map(|(name, default)| {
                    map.remove(&name).or(default).ok_or_else(|| missing(&name))
                })
                .collect(),
        }
    }
}

fn missing(name: &str) -> ErrorObject {
    ErrorObject::invalid_params(&format!("missing argument '{}'", name))
}

async fn settle(replied: oneshot::Receiver<Outcome>, deferred: HandlerFuture) -> Outcome {
    let deferred = AssertUnwindSafe(deferred).catch_unwind();
    match future::select(replied, deferred).await {
        Either::Left((Ok(outcome), _late)) => {
            debug!("Handler answered through its responder before the deferred outcome");
            outcome
        }
        Either::Left((Err(_), deferred)) => deferred.await.unwrap_or_else(|p| Err(panicked(p))),
        Either::Right((settled, _)) => settled.unwrap_or_else(|p| Err(panicked(p))),
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> HandlerError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    };
    error!(panic = %message, "Method handler panicked");
    HandlerError::Fault(message)
}
