//! # JSON-RPC Client
//!
//! Builds well-formed JSON-RPC 1.0/2.0 requests, hands them to a pluggable
//! [`Transport`], and correlates what comes back.
//!
//! ## Features
//!
//! - **Request building**: generated ids, explicit ids, or notifications
//! - **Two completion contracts**: [`Client::send`] returns the whole response,
//!   [`Client::send_split`] separates the JSON-RPC error from the result
//! - **Batches**: answers split into errors and results, correlated by id
//! - **Transport agnostic**: anything that can move one JSON document each way
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::FutureExt;
//! use serde_json::json;
//! use tandem_rpc_client::{Client, transport::FnTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = FnTransport::new(|payload: String| {
//!     async move { Ok(Some(payload)) }.boxed()
//! });
//! let client = Client::builder(transport).build();
//!
//! match client.request("add", json!([1, 2])).await? {
//!     Ok(result) => println!("result: {}", result),
//!     Err(rpc_error) => println!("server said: {}", rpc_error),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod pending;
pub mod prelude;
pub mod transport;

// Re-export main types
pub use client::{BatchResponse, Client, ClientBuilder, IdGenerator, IdSpec};
pub use config::{ClientConfig, TimeoutConfig};
pub use error::{ClientError, ClientResult, TransportError};
pub use pending::PendingRequests;

// Re-export transport types
pub use transport::{
    BoxedTransport, FnTransport, StatisticsRecorder, Transport, TransportStatistics, TransportType,
};
