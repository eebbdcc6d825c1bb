//! # JSON-RPC Wire Prelude
//!
//! Convenient re-exports of the most commonly used wire types.
//!
//! ```rust
//! use tandem_json_rpc::prelude::*;
//! ```

pub use crate::classify::{is_batch, is_notification, is_valid_error_shape, is_valid_request};
pub use crate::codec::{Codec, Hook, Message, Reply};
pub use crate::error::{CodecError, ErrorCode, ErrorObject};
pub use crate::params::Params;
pub use crate::request::Request;
pub use crate::response::{Payload, Response};
pub use crate::types::{Encoding, RequestId, Version};

// Standard error codes
pub use crate::error_codes::*;
