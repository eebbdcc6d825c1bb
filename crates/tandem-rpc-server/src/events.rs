//! Observability events emitted while dispatching

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Lifecycle event for a single validated request
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A request passed validation and is about to be routed
    Request(Value),
    /// The request finished; `response` is `None` for notifications
    Response {
        request: Value,
        response: Option<Value>,
    },
}

/// Fan-out of [`ServerEvent`]s to any number of subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ServerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ServerEvent) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        if self.tx.send(event).is_err() {
            trace!("Event dropped, subscribers went away");
        }
    }
}
