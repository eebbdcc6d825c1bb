//! # Server Prelude
//!
//! ```rust
//! use tandem_rpc_server::prelude::*;
//! ```

pub use crate::config::ServerConfig;
pub use crate::error::{HandlerError, RegistryError};
pub use crate::events::ServerEvent;
pub use crate::local::LocalTransport;
pub use crate::method::{Handled, Method, MethodOptions, Outcome, ParamSpec, Responder};
pub use crate::registry::Definition;
pub use crate::router::Router;
pub use crate::server::{Server, ServerBuilder};

pub use tandem_rpc_client::prelude::*;
