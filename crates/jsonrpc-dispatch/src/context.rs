//! Transport request details visible to handlers

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::SocketAddr;

/// Details of the transport request that carried a call.
///
/// Transports fill this in before dispatching and handlers read it through
/// [`RpcMethod::invoke_with_context`](crate::RpcMethod::invoke_with_context).
/// Header names are stored lowercased; repeated headers are joined with `", "`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Transport method, e.g. `POST`
    pub method: Option<String>,
    /// Request target as received
    pub uri: Option<String>,
    pub headers: HashMap<String, String>,
    /// Remote address of the connection
    pub peer_addr: Option<SocketAddr>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Add a header, appending to any earlier value of the same name
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.headers.entry(name.as_ref().to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
        self
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let context = RequestContext::new().with_header("X-Client-Id", "abc");

        assert_eq!(context.header("x-client-id"), Some("abc"));
        assert_eq!(context.header("X-CLIENT-ID"), Some("abc"));
        assert_eq!(context.header("missing"), None);
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let context = RequestContext::new()
            .with_header("Accept", "application/json")
            .with_header("accept", "text/plain");

        assert_eq!(context.header("accept"), Some("application/json, text/plain"));
    }

    #[test]
    fn test_builder_fields() {
        let addr = SocketAddr::from(([10, 0, 0, 1], 4242));
        let context = RequestContext::new()
            .with_method("POST")
            .with_uri("/rpc?trace=1")
            .with_peer_addr(addr);

        assert_eq!(context.method.as_deref(), Some("POST"));
        assert_eq!(context.uri.as_deref(), Some("/rpc?trace=1"));
        assert_eq!(context.peer_addr, Some(addr));
        assert!(context.headers.is_empty());
    }
}
