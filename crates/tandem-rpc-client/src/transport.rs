//! Transport layer for the client
//!
//! A transport moves one complete JSON document out and, unless the peer stays
//! silent (notifications), one complete JSON document back. Framing, sockets and
//! TLS are the binding's business. Text transports only see text; byte
//! transports get the document already converted with the client's charset.

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::TransportError;

/// Transport type enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportType {
    /// Dispatches into a server living in the same process
    InProcess,
    Http,
    Tcp,
    Tls,
    WebSocket,
    /// Any other binding, named by its implementor
    Custom(String),
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::InProcess => write!(f, "in-process"),
            TransportType::Http => write!(f, "HTTP"),
            TransportType::Tcp => write!(f, "TCP"),
            TransportType::Tls => write!(f, "TLS"),
            TransportType::WebSocket => write!(f, "WebSocket"),
            TransportType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Transport trait defining the interface for all transport implementations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get transport type
    fn transport_type(&self) -> TransportType;

    /// Deliver one payload and wait for the peer's answer.
    ///
    /// `Ok(None)` means the peer accepted the payload without answering, which is
    /// the normal outcome for notifications.
    async fn send(&self, payload: String) -> Result<Option<String>, TransportError>;

    /// True when payloads should go through [`Transport::send_bytes`]
    fn carries_bytes(&self) -> bool {
        false
    }

    /// Deliver one payload already encoded in the client's charset
    async fn send_bytes(&self, _payload: Vec<u8>) -> Result<Option<Vec<u8>>, TransportError> {
        Err(TransportError::Unsupported(format!(
            "{} transport does not carry raw bytes",
            self.transport_type()
        )))
    }

    /// Get transport statistics
    fn statistics(&self) -> TransportStatistics {
        TransportStatistics::default()
    }
}

/// Type alias for a shared transport
pub type BoxedTransport = Arc<dyn Transport>;

/// Transport statistics for monitoring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportStatistics {
    /// Number of payloads sent
    pub requests_sent: u64,
    /// Number of payloads answered by the peer
    pub responses_received: u64,
    /// Number of payloads the peer accepted without answering
    pub silent_acks: u64,
    /// Number of errors encountered
    pub errors: u64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Shared counters a transport implementation can update from `&self`
#[derive(Debug, Default)]
pub struct StatisticsRecorder {
    inner: Mutex<TransportStatistics>,
}

impl StatisticsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the outcome of one `send` into the counters
    pub fn record<T>(&self, outcome: &Result<Option<T>, TransportError>) {
        let mut stats = self.inner.lock();
        stats.requests_sent += 1;
        match outcome {
            Ok(Some(_)) => stats.responses_received += 1,
            Ok(None) => stats.silent_acks += 1,
            Err(e) => {
                stats.errors += 1;
                stats.last_error = Some(e.to_string());
            }
        }
    }

    pub fn snapshot(&self) -> TransportStatistics {
        self.inner.lock().clone()
    }
}

type SendFn = dyn Fn(String) -> BoxFuture<'static, Result<Option<String>, TransportError>> + Send + Sync;

/// Transport backed by a closure, for bindings that are a single async call
pub struct FnTransport {
    transport_type: TransportType,
    send_fn: Box<SendFn>,
    stats: StatisticsRecorder,
}

impl FnTransport {
    pub fn new<F>(send_fn: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, Result<Option<String>, TransportError>> + Send + Sync + 'static,
    {
        Self {
            transport_type: TransportType::Custom("fn".to_string()),
            send_fn: Box::new(send_fn),
            stats: StatisticsRecorder::new(),
        }
    }

    pub fn with_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }
}

#[async_trait]
impl Transport for FnTransport {
    fn transport_type(&self) -> TransportType {
        self.transport_type.clone()
    }

    async fn send(&self, payload: String) -> Result<Option<String>, TransportError> {
        let outcome = (self.send_fn)(payload).await;
        self.stats.record(&outcome);
        outcome
    }

    fn statistics(&self) -> TransportStatistics {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_fn_transport_records_statistics() {
        let transport = FnTransport::new(|payload: String| {
            async move {
                match payload.as_str() {
                    "silent" => Ok(None),
                    "fail" => Err(TransportError::ConnectionFailed("refused".to_string())),
                    other => Ok(Some(other.to_string())),
                }
            }
            .boxed()
        });

        assert_eq!(transport.send("echo".to_string()).await.unwrap(), Some("echo".to_string()));
        assert_eq!(transport.send("silent".to_string()).await.unwrap(), None);
        assert!(transport.send("fail".to_string()).await.is_err());

        let stats = transport.statistics();
        assert_eq!(stats.requests_sent, 3);
        assert_eq!(stats.responses_received, 1);
        assert_eq!(stats.silent_acks, 1);
        assert_eq!(stats.errors, 1);
        assert!(stats.last_error.unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn test_text_transport_refuses_bytes() {
        let transport = FnTransport::new(|payload: String| async move { Ok(Some(payload)) }.boxed())
            .with_type(TransportType::Http);
        assert!(!transport.carries_bytes());
        let err = transport.send_bytes(b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, TransportError::Unsupported(ref msg) if msg.contains("HTTP")));
    }

    #[test]
    fn test_transport_type_display() {
        assert_eq!(TransportType::InProcess.to_string(), "in-process");
        assert_eq!(TransportType::Custom("ipc".into()).to_string(), "ipc");
    }
}
