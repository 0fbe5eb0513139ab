use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-RPC version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }

    /// Parse a version string, accepting only the exact literal "2.0"
    pub fn parse(version: &str) -> Option<Self> {
        match version {
            crate::JSONRPC_VERSION => Some(JsonRpcVersion::V2_0),
            _ => None,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JsonRpcVersion::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid JSON-RPC version: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_version() {
        let version = JsonRpcVersion::V2_0;
        assert_eq!(version.as_str(), "2.0");
        assert_eq!(serde_json::to_string(&version).unwrap(), r#""2.0""#);
    }

    #[test]
    fn test_version_parse_is_exact() {
        assert_eq!(JsonRpcVersion::parse("2.0"), Some(JsonRpcVersion::V2_0));
        assert_eq!(JsonRpcVersion::parse("2"), None);
        assert_eq!(JsonRpcVersion::parse("1.0"), None);
        assert_eq!(JsonRpcVersion::parse(""), None);
        assert!(serde_json::from_str::<JsonRpcVersion>(r#""1.0""#).is_err());
    }
}
