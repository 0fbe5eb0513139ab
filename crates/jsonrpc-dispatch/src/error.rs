use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error_codes;

/// Error codes known to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    CommonError,
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    EmptyRequest,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::CommonError => error_codes::COMMON_ERROR,
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::EmptyRequest => error_codes::EMPTY_REQUEST,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::CommonError => "Common Error",
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::EmptyRequest => "Wrong data or Empty request",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC error object, as returned by handlers and nested in error envelopes.
///
/// Handlers are free to use any code; the dispatcher copies code, message and
/// data into the reply without altering them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data to the error
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error() -> Self {
        JsonRpcErrorCode::ParseError.into()
    }

    pub fn invalid_request() -> Self {
        JsonRpcErrorCode::InvalidRequest.into()
    }

    pub fn method_not_found() -> Self {
        JsonRpcErrorCode::MethodNotFound.into()
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: Option<String>) -> Self {
        match message {
            Some(message) => Self::new(error_codes::INTERNAL_ERROR, message),
            None => JsonRpcErrorCode::InternalError.into(),
        }
    }

    /// Wrong data or empty request (-20), for handlers that reject their params
    pub fn empty_request() -> Self {
        JsonRpcErrorCode::EmptyRequest.into()
    }
}

impl From<JsonRpcErrorCode> for RpcError {
    fn from(code: JsonRpcErrorCode) -> Self {
        Self::new(code.code(), code.message())
    }
}

/// Params that fail to deserialize surface as Invalid params
impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_params(err.to_string())
    }
}
