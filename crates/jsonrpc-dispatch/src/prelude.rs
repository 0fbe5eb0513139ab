//! # JSON-RPC Dispatcher Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use jsonrpc_dispatch::prelude::*;
//! ```

pub use crate::config::{BatchMode, DispatcherConfig, NotificationPolicy};
pub use crate::context::RequestContext;
pub use crate::dispatch::{DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use crate::error::{JsonRpcErrorCode, RpcError};
pub use crate::registry::{MethodRegistry, RpcMethod};
pub use crate::request::{IncomingCall, parse_params};
pub use crate::response::{JsonRpcMessage, format_error, format_success};

// Error codes
pub use crate::error_codes::*;
