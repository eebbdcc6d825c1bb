//! # JSON-RPC Dispatch Engine
//!
//! Transport-agnostic server for JSON-RPC 1.0 and 2.0. Hand it raw text (or
//! bytes, or decoded values) from any binding; it validates, routes, runs
//! handlers and produces at most one reply.
//!
//! ## Features
//! - Batches run concurrently and answer in input order
//! - Per-method parameter shaping with declared names and defaults
//! - Custom routers, including relays to other endpoints through a client
//! - Handler panics and faults become INTERNAL_ERROR responses
//! - Request/response events for observability
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use tandem_rpc_server::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let server = Server::builder().collect(false).params(ParamSpec::ordered(["a", "b"])).build();
//! server
//!     .register("add", Definition::from_fn(|params| {
//!         let a = params.get_index(0).and_then(|v| v.as_i64()).unwrap_or(0);
//!         let b = params.get_index(1).and_then(|v| v.as_i64()).unwrap_or(0);
//!         Ok(json!(a + b))
//!     }))
//!     .unwrap();
//!
//! let reply = server
//!     .handle_str(r#"{"jsonrpc":"2.0","method":"add","params":{"b":4,"a":3},"id":1}"#)
//!     .await
//!     .unwrap();
//! let reply: serde_json::Value = serde_json::from_str(&reply).unwrap();
//! assert_eq!(reply, json!({"jsonrpc": "2.0", "result": 7, "id": 1}));
//! # });
//! ```

mod batch;
pub mod config;
pub mod error;
pub mod events;
pub mod local;
pub mod method;
pub mod prelude;
pub mod registry;
mod relay;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{HandlerError, RegistryError};
pub use events::{EventBus, ServerEvent};
pub use local::LocalTransport;
pub use method::{Handled, Handler, Method, MethodOptions, Outcome, ParamSpec, Responder};
pub use registry::{Definition, Registry};
pub use router::{RegistryRouter, Router};
pub use server::{Server, ServerBuilder};
