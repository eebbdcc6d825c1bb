#![allow(dead_code)]

use serde_json::{Value, json};
use tandem_rpc_server::prelude::*;

/// Install a test subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn int_arg(params: &Params, index: usize) -> i64 {
    params.get_index(index).and_then(Value::as_i64).unwrap_or(0)
}

/// Server with the arithmetic methods most tests use
pub fn calculator() -> Server {
    let server = Server::new();
    let spread = MethodOptions::new()
        .with_collect(false)
        .with_params(ParamSpec::ordered(["a", "b"]));

    server
        .register(
            "add",
            Method::from_fn(
                |params| Ok(json!(int_arg(&params, 0) + int_arg(&params, 1))),
                spread.clone(),
            ),
        )
        .unwrap();
    server
        .register(
            "subtract",
            Method::from_fn(|params| Ok(json!(int_arg(&params, 0) - int_arg(&params, 1))), spread),
        )
        .unwrap();
    server
        .register(
            "sleep",
            Definition::from_async(|params| async move {
                let ms = params.get_index(0).and_then(Value::as_u64).unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(json!(ms))
            }),
        )
        .unwrap();
    server
}

pub fn parse(reply: &str) -> Value {
    serde_json::from_str(reply).unwrap()
}
