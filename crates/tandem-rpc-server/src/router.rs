//! Method routing

use tandem_json_rpc::Params;

use crate::registry::Definition;
use crate::server::Server;

/// Resolves a method name to a definition for one call.
///
/// Routers see the request params and may synthesize definitions on the fly.
/// Returning `None` answers the call with METHOD_NOT_FOUND.
pub trait Router: Send + Sync {
    fn route(&self, server: &Server, method: &str, params: Option<&Params>) -> Option<Definition>;
}

impl<F> Router for F
where
    F: Fn(&Server, &str, Option<&Params>) -> Option<Definition> + Send + Sync,
{
    fn route(&self, server: &Server, method: &str, params: Option<&Params>) -> Option<Definition> {
        self(server, method, params)
    }
}

/// Plain lookup in the server's registry
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryRouter;

impl Router for RegistryRouter {
    fn route(&self, server: &Server, method: &str, _params: Option<&Params>) -> Option<Definition> {
        server.registry().get(method)
    }
}
