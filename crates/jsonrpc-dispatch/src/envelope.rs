//! Top-level payload decoding

use serde_json::Value;

/// Shape of a decoded payload
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// Anything that is not an array; non-objects are rejected per call
    Single(Value),
    /// An ordered sequence of calls
    Batch(Vec<Value>),
}

impl Envelope {
    pub fn is_batch(&self) -> bool {
        matches!(self, Envelope::Batch(_))
    }
}

impl From<Value> for Envelope {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Envelope::Batch(items),
            other => Envelope::Single(other),
        }
    }
}

/// Parse raw bytes into a single call or a batch.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, serde_json::Error> {
    serde_json::from_slice::<Value>(bytes).map(Envelope::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_single() {
        let envelope = decode_envelope(br#"{"jsonrpc":"2.0","method":"m","id":1}"#).unwrap();
        assert!(!envelope.is_batch());
        assert_eq!(envelope, Envelope::Single(json!({"jsonrpc":"2.0","method":"m","id":1})));
    }

    #[test]
    fn test_decode_batch_keeps_order() {
        let envelope = decode_envelope(br#"[{"id":1},{"id":2},3]"#).unwrap();
        assert_eq!(
            envelope,
            Envelope::Batch(vec![json!({"id": 1}), json!({"id": 2}), json!(3)])
        );
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(decode_envelope(b"{\"jsonrpc\": ").is_err());
        assert!(decode_envelope(b"").is_err());
        assert!(decode_envelope(b"not json").is_err());
    }

    #[test]
    fn test_scalars_are_single() {
        assert_eq!(decode_envelope(b"42").unwrap(), Envelope::Single(json!(42)));
        assert_eq!(decode_envelope(b"null").unwrap(), Envelope::Single(Value::Null));
    }
}
