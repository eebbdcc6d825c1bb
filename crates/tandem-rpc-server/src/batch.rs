//! Batch fan-out and slot-ordered fan-in

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use tandem_json_rpc::{ErrorObject, Reply, Response, Version};
use tracing::debug;

use crate::server::Server;

/// Per-item state while a batch is in flight
#[derive(Debug)]
enum Slot {
    Pending,
    Notified,
    Done(Response),
}

/// Run every item of a batch concurrently and collect the answers in input order.
///
/// Items complete in any order; each lands in the slot of its input index, so
/// the reply order never depends on completion order. Notification slots are
/// dropped. A batch made only of notifications yields no reply at all.
pub(crate) async fn dispatch(server: &Server, items: Vec<Value>) -> Option<Reply> {
    if server.version() == Version::V1 {
        debug!("Batch received by a 1.0 server");
        return Some(invalid_request());
    }
    if items.is_empty() {
        return Some(invalid_request());
    }

    debug!(size = items.len(), "Dispatching batch");
    let mut slots: Vec<Slot> = items.iter().map(|_| Slot::Pending).collect();
    let mut in_flight: FuturesUnordered<_> = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| async move {
            let outcome = if item.is_array() {
                Some(Response::error(Value::Null, ErrorObject::invalid_request(None)))
            } else {
                server.dispatch_one(item).await
            };
            (index, outcome)
        })
        .collect();

    while let Some((index, outcome)) = in_flight.next().await {
        slots[index] = match outcome {
            Some(response) => Slot::Done(response),
            None => Slot::Notified,
        };
    }

    let responses: Vec<Response> = slots
        .into_iter()
        .filter_map(|slot| match slot {
            Slot::Done(response) => Some(response),
            Slot::Notified => None,
            Slot::Pending => {
                debug!("Batch slot never completed");
                None
            }
        })
        .collect();

    if responses.is_empty() {
        None
    } else {
        Some(Reply::Batch(responses))
    }
}

fn invalid_request() -> Reply {
    Reply::Single(Response::error(Value::Null, ErrorObject::invalid_request(None)))
}
