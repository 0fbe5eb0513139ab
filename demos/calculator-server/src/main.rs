//! # Calculator JSON-RPC Server
//!
//! Serves a few calculator methods over HTTP using both registration styles,
//! plus `client_info`, which reports the caller from the request context.
//!
//! ## Usage
//! ```bash
//! cargo run --bin calculator-server -- --bind 127.0.0.1:8000
//! curl -s -X POST http://127.0.0.1:8000/rpc \
//!   -d '{"jsonrpc":"2.0","method":"add","params":[2,3],"id":7}'
//! ```

use std::net::SocketAddr;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use jsonrpc_dispatch::{Dispatcher, NotificationPolicy, RpcError, RpcMethod, parse_params};
use jsonrpc_dispatch_http::HttpRpcServer;

#[derive(Parser)]
#[command(name = "calculator-server")]
#[command(about = "JSON-RPC 2.0 calculator over HTTP")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    #[arg(long, default_value = "/rpc")]
    path: String,

    /// Treat `"id": 0` as a regular id instead of a notification
    #[arg(long)]
    strict_ids: bool,

    #[arg(long)]
    no_cors: bool,
}

#[derive(Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

/// Struct-style handler: divides named operands
struct Divide;

#[async_trait]
impl RpcMethod for Divide {
    async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let Some(params) = params else {
            return Err(RpcError::empty_request());
        };
        let Operands { a, b } = parse_params(Some(params))?;
        if b == 0.0 {
            return Err(RpcError::new(-32000, "Division by zero"));
        }
        Ok(json!(a / b))
    }
}

fn add(params: Option<Value>) -> Result<Value, RpcError> {
    let numbers: Vec<i64> = parse_params(params)?;
    if numbers.is_empty() {
        return Err(RpcError::empty_request());
    }
    Ok(json!(numbers.iter().sum::<i64>()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let policy = if args.strict_ids {
        NotificationPolicy::AbsentOnly
    } else {
        NotificationPolicy::AbsentOrZero
    };

    let dispatcher = Dispatcher::builder()
        .notification_policy(policy)
        .register_fn("add", add)
        .register_fn("subtract", |params| {
            let Operands { a, b } = parse_params(params)?;
            Ok(json!(a - b))
        })
        .register("divide", Divide)
        .register_fn("log", |params| {
            info!("log: {}", params.unwrap_or(serde_json::Value::Null));
            Ok(Value::Null)
        })
        .register_context_fn("client_info", |_, context| {
            let Some(context) = context else {
                return Err(RpcError::empty_request());
            };
            Ok(json!({
                "peer": context.peer_addr.map(|addr| addr.to_string()),
                "user_agent": context.header("user-agent"),
            }))
        })
        .build_shared();

    info!("Registered methods: {:?}", dispatcher.registered_methods());

    let server = HttpRpcServer::builder(dispatcher)
        .bind_address(args.bind)
        .rpc_path(args.path)
        .cors(!args.no_cors)
        .build();

    server.run().await?;
    Ok(())
}
