//! # Client Prelude
//!
//! This module provides convenient re-exports of the most commonly used types
//! and traits from the client library.
//!
//! ```rust
//! use tandem_rpc_client::prelude::*;
//! ```

// Core client types
pub use crate::client::{BatchResponse, Client, ClientBuilder, IdSpec};
pub use crate::config::{ClientConfig, TimeoutConfig};
pub use crate::error::{ClientError, ClientResult, TransportError};

// Transport types
pub use crate::transport::{Transport, TransportType};

// Re-export wire types for convenience
pub use tandem_json_rpc::prelude::*;

// Standard library types commonly used with the client
pub use std::time::Duration;
