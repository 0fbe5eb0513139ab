//! # JSON-RPC 2.0 Dispatcher
//!
//! A transport-agnostic JSON-RPC 2.0 dispatch engine. It takes the raw bytes of
//! one call or a batch of calls, validates each call, resolves it against a
//! [`MethodRegistry`], invokes the handler and returns the serialized reply.
//!
//! ## Features
//! - Single calls and batches, with notifications elided from the output
//! - Two registration styles: handler objects ([`RpcMethod`]) and closures
//! - Strict, fail-closed decoding of each call
//! - Configurable notification policy for the `id == 0` legacy behavior
//! - Optional [`RequestContext`] so handlers can read the transport request
//!
//! ```rust
//! use jsonrpc_dispatch::{Dispatcher, parse_params};
//! use serde_json::json;
//!
//! # futures::executor::block_on(async {
//! let dispatcher = Dispatcher::builder()
//!     .register_fn("add", |params| {
//!         let (a, b): (i64, i64) = parse_params(params)?;
//!         Ok(json!(a + b))
//!     })
//!     .build();
//!
//! let reply = dispatcher
//!     .handle_str(r#"{"jsonrpc":"2.0","method":"add","params":[2,3],"id":7}"#)
//!     .await;
//! assert_eq!(reply, r#"{"jsonrpc":"2.0","id":7,"result":5}"#);
//! # });
//! ```

pub mod config;
pub mod context;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use config::{BatchMode, DispatcherConfig, NotificationPolicy};
pub use context::RequestContext;
pub use dispatch::{DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use envelope::{Envelope, decode_envelope};
pub use error::{JsonRpcErrorCode, RpcError};
pub use registry::{AsyncFnMethod, ContextFnMethod, FnMethod, MethodRegistry, RpcMethod};
pub use request::{IncomingCall, parse_params};
pub use response::{
    JsonRpcError, JsonRpcMessage, JsonRpcResponse, common_error_body, format_error, format_success,
};
pub use types::JsonRpcVersion;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes produced by the dispatcher and its helpers
pub mod error_codes {
    /// Whole payload was not valid JSON (non-standard)
    pub const COMMON_ERROR: i64 = -42700;
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Helper code for handlers rejecting missing or unusable params
    pub const EMPTY_REQUEST: i64 = -20;
}
