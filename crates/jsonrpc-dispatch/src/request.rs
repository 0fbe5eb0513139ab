use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::NotificationPolicy;
use crate::error::RpcError;

/// One decoded JSON-RPC call.
///
/// Decoding is strict: `jsonrpc` and `method` must be strings and `id` must
/// be an integer when present. Missing or `null` `jsonrpc`/`method` decode as
/// empty strings so that version and method validation report them; a `null`
/// `params` or `id` is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingCall {
    #[serde(rename = "jsonrpc", default, deserialize_with = "null_as_empty")]
    pub version: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl IncomingCall {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<i64>) -> Self {
        Self {
            version: crate::JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }

    /// Decode a call from a generic JSON object
    pub fn from_object(object: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(object))
    }

    /// Best-effort id for error replies when the object failed to decode
    pub fn recover_id(object: &Map<String, Value>) -> i64 {
        object.get("id").and_then(Value::as_i64).unwrap_or(0)
    }

    /// Id echoed in the reply; calls without an id answer with `0`
    pub fn response_id(&self) -> i64 {
        self.id.unwrap_or(0)
    }

    pub fn is_notification(&self, policy: NotificationPolicy) -> bool {
        policy.is_notification(self.id)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize handler params into a typed value.
///
/// Absent params deserialize from `null`, so `Option<T>` and `()` targets
/// accept calls without params. Failures map to Invalid params (-32602).
pub fn parse_params<T>(params: Option<Value>) -> Result<T, RpcError>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(params.unwrap_or(Value::Null))?)
}
