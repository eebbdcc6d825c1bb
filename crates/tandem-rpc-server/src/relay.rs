//! Relay adapter: forward a call to another endpoint through a client

use serde_json::Value;
use tandem_json_rpc::{ErrorObject, Payload, Request};
use tandem_rpc_client::Client;
use tracing::{debug, warn};

/// Forward `request` with its method, params and id unchanged.
///
/// The target's result or error is relayed verbatim. Transport and codec
/// failures become INTERNAL_ERROR.
pub(crate) async fn forward(client: &Client, request: &Request) -> Result<Value, ErrorObject> {
    debug!(method = %request.method, "Relaying request");
    let forwarded = client
        .forward(&request.method, request.params.clone(), request.id.clone())
        .await;

    match forwarded {
        Ok(Some(response)) => match response.payload {
            Payload::Result(result) => Ok(result),
            Payload::Error(error) => Err(error),
        },
        Ok(None) if request.is_notification() => Ok(Value::Null),
        Ok(None) => {
            warn!(method = %request.method, "Relay target sent no response");
            Err(ErrorObject::internal_error(Some(
                "relay target sent no response".to_string(),
            )))
        }
        Err(e) => {
            warn!(method = %request.method, error = %e, "Relay failed");
            Err(ErrorObject::internal_error(Some(e.to_string())))
        }
    }
}
