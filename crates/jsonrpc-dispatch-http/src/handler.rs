//! HTTP request handling for the JSON-RPC endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use http::request::Parts;
use http::{Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use tracing::{debug, warn};

use jsonrpc_dispatch::{Dispatcher, RequestContext};

use crate::{CorsLayer, HttpServerError, Result, ServerConfig};

/// Routes HTTP requests to the dispatcher.
///
/// `POST` on the configured path dispatches the body, `OPTIONS` answers CORS
/// preflight, other methods get 405 and other paths 404.
#[derive(Clone)]
pub struct RpcHttpHandler {
    dispatcher: Arc<Dispatcher>,
    config: Arc<ServerConfig>,
}

impl RpcHttpHandler {
    pub fn new(dispatcher: Arc<Dispatcher>, config: Arc<ServerConfig>) -> Self {
        Self { dispatcher, config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        self.handle_from(req, None).await
    }

    /// Handle a request received from `peer_addr`
    pub async fn handle_from<B>(
        &self,
        req: Request<B>,
        peer_addr: Option<SocketAddr>,
    ) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        debug!("Handling {} {}", parts.method, parts.uri.path());

        let mut response = if parts.uri.path() != self.config.rpc_path {
            plain_response(StatusCode::NOT_FOUND, "Not Found")
        } else if parts.method == Method::OPTIONS {
            plain_response(StatusCode::NO_CONTENT, Bytes::new())
        } else if parts.method == Method::POST {
            let context = request_context(&parts, peer_addr);
            self.handle_post(body, &context).await
        } else {
            let mut response = plain_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
            response
        };

        if self.config.enable_cors {
            CorsLayer::apply_cors_headers(response.headers_mut());
        }
        response
    }

    async fn handle_post<B>(&self, body: B, context: &RequestContext) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let bytes = match read_body(body, self.config.max_body_size).await {
            Ok(bytes) => bytes,
            Err(err @ HttpServerError::PayloadTooLarge { .. }) => {
                warn!("{}", err);
                return plain_response(StatusCode::PAYLOAD_TOO_LARGE, err.to_string());
            }
            Err(err) => {
                warn!("{}", err);
                return plain_response(StatusCode::BAD_REQUEST, err.to_string());
            }
        };

        let reply = self
            .dispatcher
            .handle_bytes_with_context(&bytes, context)
            .await;

        let mut response = plain_response(StatusCode::OK, reply);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

/// Snapshot of the request line, headers and peer for handlers
fn request_context(parts: &Parts, peer_addr: Option<SocketAddr>) -> RequestContext {
    let mut context = RequestContext::new()
        .with_method(parts.method.as_str())
        .with_uri(parts.uri.to_string());
    for (name, value) in &parts.headers {
        match value.to_str() {
            Ok(value) => context = context.with_header(name.as_str(), value),
            Err(_) => debug!("Skipping non-visible-ASCII header {}", name),
        }
    }
    if let Some(addr) = peer_addr {
        context = context.with_peer_addr(addr);
    }
    context
}

/// Collect a request body, bounded by `limit` bytes
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(HttpServerError::PayloadTooLarge { limit })
        }
        Err(err) => Err(HttpServerError::Body(err.to_string())),
    }
}

fn plain_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}
