use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{JsonRpcErrorCode, RpcError};
use crate::types::JsonRpcVersion;

/// Fixed reply for a payload that is not valid JSON at all.
///
/// Unlike regular envelopes it carries no `id` and keeps the legacy spacing
/// existing clients compare against byte for byte.
pub fn common_error_body() -> String {
    let code = JsonRpcErrorCode::CommonError;
    format!(
        r#"{{"jsonrpc": "{}", "error": {{"code": {}, "message": "{}"}}}}"#,
        JsonRpcVersion::V2_0.as_str(),
        code.code(),
        code.message()
    )
}

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: i64,
    pub result: Value,
}

impl JsonRpcResponse {
    pub fn new(id: i64, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            result,
        }
    }
}

/// A JSON-RPC error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub id: i64,
    pub error: RpcError,
}

impl JsonRpcError {
    pub fn new(id: i64, error: RpcError) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            error,
        }
    }
}

/// Either a success or an error envelope, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Successful response with result field
    Response(JsonRpcResponse),
    /// Error response with error field
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    pub fn success(id: i64, result: Value) -> Self {
        Self::Response(JsonRpcResponse::new(id, result))
    }

    pub fn error(id: i64, error: RpcError) -> Self {
        Self::Error(JsonRpcError::new(id, error))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    pub fn id(&self) -> i64 {
        match self {
            JsonRpcMessage::Response(resp) => resp.id,
            JsonRpcMessage::Error(err) => err.id,
        }
    }

    /// Serialize the envelope.
    ///
    /// Value payloads always serialize; should that ever fail the reply
    /// degrades to an Internal error envelope for the same id.
    pub fn to_json_string(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(err) => {
                error!("Failed to serialize response for id {}: {}", self.id(), err);
                format!(
                    r#"{{"jsonrpc":"2.0","id":{},"error":{{"code":-32603,"message":"Internal error"}}}}"#,
                    self.id()
                )
            }
        }
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(response: JsonRpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<JsonRpcError> for JsonRpcMessage {
    fn from(error: JsonRpcError) -> Self {
        Self::Error(error)
    }
}

/// Format a success envelope
pub fn format_success(id: i64, result: Value) -> String {
    JsonRpcMessage::success(id, result).to_json_string()
}

/// Format an error envelope
pub fn format_error(id: i64, error: RpcError) -> String {
    JsonRpcMessage::error(id, error).to_json_string()
}
