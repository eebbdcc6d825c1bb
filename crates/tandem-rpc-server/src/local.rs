//! In-process transport

use async_trait::async_trait;
use tandem_rpc_client::{StatisticsRecorder, Transport, TransportError, TransportStatistics, TransportType};

use crate::server::Server;

/// Client transport that hands payloads straight to a [`Server`]
#[derive(Debug)]
pub struct LocalTransport {
    server: Server,
    /// Go through [`Server::handle_bytes`] instead of the text entry point
    bytes: bool,
    stats: StatisticsRecorder,
}

impl LocalTransport {
    pub fn new(server: Server) -> Self {
        Self {
            server,
            bytes: false,
            stats: StatisticsRecorder::new(),
        }
    }

    /// Transport that exchanges raw bytes in the server's configured charset
    pub fn bytes(server: Server) -> Self {
        Self {
            bytes: true,
            ..Self::new(server)
        }
    }

    pub fn server(&self) -> &Server {
        &self.server
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::InProcess
    }

    async fn send(&self, payload: String) -> Result<Option<String>, TransportError> {
        let outcome = Ok(self.server.handle_str(&payload).await);
        self.stats.record(&outcome);
        outcome
    }

    fn carries_bytes(&self) -> bool {
        self.bytes
    }

    async fn send_bytes(&self, payload: Vec<u8>) -> Result<Option<Vec<u8>>, TransportError> {
        let outcome = Ok(self.server.handle_bytes(&payload).await);
        self.stats.record(&outcome);
        outcome
    }

    fn statistics(&self) -> TransportStatistics {
        self.stats.snapshot()
    }
}
