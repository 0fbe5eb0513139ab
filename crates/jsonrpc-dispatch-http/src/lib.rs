//! # HTTP JSON-RPC Server
//!
//! HTTP transport binding for [`jsonrpc_dispatch`]. Request bodies are handed
//! to the [`Dispatcher`] unchanged and its output is written back verbatim as
//! an `application/json` body, with permissive CORS headers when enabled.
//! Handlers see the request line, headers and peer address through
//! [`jsonrpc_dispatch::RequestContext`].

pub mod cors;
pub mod handler;
pub mod server;

// Re-export main types
pub use cors::CorsLayer;
pub use handler::RpcHttpHandler;
pub use server::{HttpRpcServer, HttpRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use jsonrpc_dispatch::{Dispatcher, DispatcherBuilder, RequestContext};

/// Result type for HTTP JSON-RPC operations
pub type Result<T> = std::result::Result<T, HttpServerError>;

/// HTTP transport errors
#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    Body(String),
}
