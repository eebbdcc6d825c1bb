//! # JSON-RPC Wire Layer
//!
//! Transport-agnostic types for JSON-RPC 1.0 and 2.0: requests, responses,
//! error objects, the classification predicates used to validate inbound
//! messages, and the codec that turns text into values and back.
//!
//! ## Features
//! - Both protocol revisions, selected per endpoint through [`Version`]
//! - Tagged [`Params`] (positional or named) with projection helpers
//! - Responses that carry exactly one of `result`/`error` by construction
//! - Reviver/replacer hooks for custom value revival on the wire

pub mod classify;
pub mod codec;
pub mod error;
pub mod params;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use codec::{Codec, Hook, Message, Reply};
pub use error::{CodecError, ErrorCode, ErrorObject};
pub use params::Params;
pub use request::Request;
pub use response::{Payload, Response};
pub use types::{Encoding, RequestId, Version};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
