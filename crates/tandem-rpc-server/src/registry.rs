//! Method registry

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tandem_json_rpc::Params;
use tandem_rpc_client::Client;
use tracing::debug;

use crate::error::RegistryError;
use crate::method::{self, Handler, Method, Outcome};

/// Names starting with this prefix are reserved for protocol extensions
pub const RESERVED_PREFIX: &str = "rpc.";

/// What a method name resolves to
#[derive(Clone)]
pub enum Definition {
    /// A handler with its own options
    Method(Arc<Method>),
    /// A bare handler; the server wraps it with its default options
    Handler(Handler),
    /// Forward the call to another endpoint
    Relay(Client),
}

impl Definition {
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Definition::Handler(method::async_handler(f))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Params) -> Outcome + Send + Sync + 'static,
    {
        Definition::Handler(method::sync_handler(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Definition::Method(_) => "method",
            Definition::Handler(_) => "handler",
            Definition::Relay(_) => "relay",
        }
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Definition::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Definition::Handler(_) => f.write_str("Handler(..)"),
            Definition::Relay(client) => f.debug_tuple("Relay").field(client).finish(),
        }
    }
}

impl From<Method> for Definition {
    fn from(method: Method) -> Self {
        Definition::Method(Arc::new(method))
    }
}

impl From<Arc<Method>> for Definition {
    fn from(method: Arc<Method>) -> Self {
        Definition::Method(method)
    }
}

impl From<Client> for Definition {
    fn from(client: Client) -> Self {
        Definition::Relay(client)
    }
}

/// Reject names that can never be dispatched
pub fn validate_name(name: &str) -> Result<(), RegistryError> {
    if name.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    if name.starts_with(RESERVED_PREFIX) {
        return Err(RegistryError::ReservedName(name.to_string()));
    }
    Ok(())
}

/// Thread-safe name to definition map
#[derive(Default)]
pub struct Registry {
    methods: RwLock<HashMap<String, Definition>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("methods", &self.names()).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition, returning the one it replaced
    pub fn register(
        &self,
        name: impl Into<String>,
        definition: Definition,
    ) -> Result<Option<Definition>, RegistryError> {
        let name = name.into();
        validate_name(&name)?;
        debug!(method = %name, kind = definition.kind(), "Registering method");
        Ok(self.methods.write().insert(name, definition))
    }

    pub fn remove(&self, name: &str) -> Option<Definition> {
        self.methods.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Definition> {
        self.methods.read().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.methods.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
