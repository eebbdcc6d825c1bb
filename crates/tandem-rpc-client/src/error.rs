//! Error types for client operations

use tandem_json_rpc::CodecError;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong before a JSON-RPC response reaches the caller.
///
/// JSON-RPC level failures are not represented here: they arrive as data inside
/// a [`tandem_json_rpc::Response`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encoding or decoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The peer answered with something that is not a JSON-RPC response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout errors
    #[error("Operation timed out")]
    Timeout,
}

/// Transport-specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport closed unexpectedly")]
    Closed,

    #[error("Unsupported transport: {0}")]
    Unsupported(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl ClientError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// True when the failure happened below the JSON-RPC layer
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::ConnectionFailed(_))
                | Self::Transport(TransportError::Closed)
                | Self::Transport(TransportError::Io(_))
                | Self::Timeout
        )
    }
}
