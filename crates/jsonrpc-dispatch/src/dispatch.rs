//! Request processing and batch aggregation

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::{BatchMode, DispatcherConfig, NotificationPolicy},
    context::RequestContext,
    envelope::{Envelope, decode_envelope},
    error::RpcError,
    registry::{MethodRegistry, RpcMethod},
    request::IncomingCall,
    response::{JsonRpcError, JsonRpcMessage, JsonRpcResponse, common_error_body},
    types::JsonRpcVersion,
};

/// Result of processing one call
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A success envelope
    Response(JsonRpcResponse),
    /// An error envelope
    Error(JsonRpcError),
    /// No reply (notification)
    NoResponse,
}

impl DispatchOutcome {
    fn error(id: i64, error: RpcError) -> Self {
        DispatchOutcome::Error(JsonRpcError::new(id, error))
    }

    /// Serialized envelope, or `None` for a notification
    pub fn to_json_string(&self) -> Option<String> {
        self.message().map(|message| message.to_json_string())
    }

    pub fn message(&self) -> Option<JsonRpcMessage> {
        match self {
            DispatchOutcome::Response(response) => Some(response.clone().into()),
            DispatchOutcome::Error(error) => Some(error.clone().into()),
            DispatchOutcome::NoResponse => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DispatchOutcome::Error(_))
    }

    pub fn needs_response(&self) -> bool {
        !matches!(self, DispatchOutcome::NoResponse)
    }
}

/// JSON-RPC dispatcher: a frozen method registry plus its configuration.
///
/// Build one with [`Dispatcher::builder`], wrap it in an `Arc` and share it
/// with every transport connection. Processing takes `&self` only.
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: MethodRegistry,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: MethodRegistry, config: DispatcherConfig) -> Self {
        Self { registry, config }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.registry.method_names()
    }

    /// Raw-bytes entry point for transports.
    ///
    /// Returns the exact reply body: an envelope, a JSON array for batches,
    /// an empty string for a single notification, or the fixed Common Error
    /// body when the bytes are not JSON.
    pub async fn handle_bytes(&self, bytes: &[u8]) -> String {
        self.dispatch_bytes(bytes, None).await
    }

    /// Like [`handle_bytes`](Self::handle_bytes), exposing the transport
    /// request to every handler the payload reaches.
    pub async fn handle_bytes_with_context(&self, bytes: &[u8], context: &RequestContext) -> String {
        self.dispatch_bytes(bytes, Some(context)).await
    }

    pub async fn handle_str(&self, payload: &str) -> String {
        self.handle_bytes(payload.as_bytes()).await
    }

    /// Handle an already parsed payload
    pub async fn handle_value(&self, value: Value) -> String {
        self.handle_envelope(Envelope::from(value)).await
    }

    pub async fn handle_envelope(&self, envelope: Envelope) -> String {
        self.dispatch_envelope(envelope, None).await
    }

    /// Process every element and join the replies into a JSON array.
    ///
    /// Notifications are dropped; an empty result is `[]`.
    pub async fn process_batch(&self, items: Vec<Value>) -> String {
        self.dispatch_batch(items, None).await
    }

    /// Validate, resolve and invoke a single call.
    pub async fn process_call(&self, call: Value) -> DispatchOutcome {
        self.dispatch_call(call, None).await
    }

    async fn dispatch_bytes(&self, bytes: &[u8], context: Option<&RequestContext>) -> String {
        match decode_envelope(bytes) {
            Ok(envelope) => self.dispatch_envelope(envelope, context).await,
            Err(err) => {
                warn!("Rejecting unparsable payload: {}", err);
                common_error_body()
            }
        }
    }

    async fn dispatch_envelope(
        &self,
        envelope: Envelope,
        context: Option<&RequestContext>,
    ) -> String {
        match envelope {
            Envelope::Batch(items) => self.dispatch_batch(items, context).await,
            Envelope::Single(item) => self
                .dispatch_call(item, context)
                .await
                .to_json_string()
                .unwrap_or_default(),
        }
    }

    async fn dispatch_batch(&self, items: Vec<Value>, context: Option<&RequestContext>) -> String {
        debug!("Processing batch of {} calls", items.len());

        let outcomes = match self.config.batch_mode {
            BatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(items.len());
                for item in items {
                    outcomes.push(self.dispatch_call(item, context).await);
                }
                outcomes
            }
            BatchMode::Concurrent => {
                join_all(
                    items
                        .into_iter()
                        .map(|item| self.dispatch_call(item, context)),
                )
                .await
            }
        };

        let replies: Vec<String> = outcomes
            .iter()
            .filter_map(DispatchOutcome::to_json_string)
            .collect();
        format!("[{}]", replies.join(","))
    }

    async fn dispatch_call(&self, call: Value, context: Option<&RequestContext>) -> DispatchOutcome {
        let Value::Object(object) = call else {
            warn!("Rejecting non-object call");
            return DispatchOutcome::error(0, RpcError::invalid_request());
        };

        let recovered_id = IncomingCall::recover_id(&object);
        let call = match IncomingCall::from_object(object) {
            Ok(call) => call,
            Err(err) => {
                warn!("Failed to decode call (id {}): {}", recovered_id, err);
                return DispatchOutcome::error(recovered_id, RpcError::parse_error());
            }
        };

        let id = call.response_id();
        if JsonRpcVersion::parse(&call.version).is_none() {
            warn!("Unsupported JSON-RPC version {:?} (id {})", call.version, id);
            return DispatchOutcome::error(id, RpcError::invalid_request());
        }

        let Some(method) = self.registry.lookup(&call.method) else {
            debug!("Method not found: {}", call.method);
            return DispatchOutcome::error(id, RpcError::method_not_found());
        };

        let notification = call.is_notification(self.config.notification_policy);
        debug!("Dispatching {} (id {:?})", call.method, call.id);
        let outcome = method.invoke_with_context(call.params, context).await;

        if notification {
            debug!("Discarding outcome of notification {}", call.method);
            return DispatchOutcome::NoResponse;
        }

        match outcome {
            Ok(result) => DispatchOutcome::Response(JsonRpcResponse::new(id, result)),
            Err(error) => DispatchOutcome::error(id, error),
        }
    }
}

/// Builder for a [`Dispatcher`]
#[derive(Debug, Default)]
pub struct DispatcherBuilder {
    registry: MethodRegistry,
    config: DispatcherConfig,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing registry
    pub fn with_registry(registry: MethodRegistry) -> Self {
        Self {
            registry,
            config: DispatcherConfig::default(),
        }
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notification_policy(mut self, policy: NotificationPolicy) -> Self {
        self.config.notification_policy = policy;
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.config.batch_mode = mode;
        self
    }

    /// Register a handler object
    pub fn register<M>(mut self, name: impl Into<String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.registry.register(name, method);
        self
    }

    /// Register a synchronous closure
    pub fn register_fn<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.registry.register_fn(name, func);
        self
    }

    /// Register a closure returning a future
    pub fn register_async_fn<F, Fut>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        self.registry.register_async_fn(name, func);
        self
    }

    /// Register a synchronous closure that reads the transport request
    pub fn register_context_fn<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Value>, Option<&RequestContext>) -> Result<Value, RpcError>
            + Send
            + Sync
            + 'static,
    {
        self.registry.register_context_fn(name, func);
        self
    }

    /// Register one handler instance under several names
    pub fn register_methods<M>(mut self, names: impl IntoIterator<Item = String>, method: M) -> Self
    where
        M: RpcMethod + 'static,
    {
        self.registry.register_methods(names, method);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.registry, self.config)
    }

    /// Build and wrap for sharing across connections
    pub fn build_shared(self) -> Arc<Dispatcher> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        calls: Arc<Mutex<Vec<Option<Value>>>>,
    }

    #[async_trait]
    impl RpcMethod for Recorder {
        async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError> {
            self.calls.lock().unwrap().push(params);
            Err(RpcError::new(-1, "recorded"))
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder()
            .register_fn("echo", |params| Ok(params.unwrap_or(Value::Null)))
            .register_fn("fail", |_| Err(RpcError::new(-32000, "handler failed")))
            .build()
    }

    #[tokio::test]
    async fn test_process_call_success() {
        let outcome = dispatcher()
            .process_call(json!({"jsonrpc": "2.0", "method": "echo", "params": {"a": 1}, "id": 3}))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Response(JsonRpcResponse::new(3, json!({"a": 1})))
        );
        assert!(outcome.needs_response());
        assert!(!outcome.is_error());
    }

    #[tokio::test]
    async fn test_handler_error_is_surfaced_verbatim() {
        let outcome = dispatcher()
            .process_call(json!({"jsonrpc": "2.0", "method": "fail", "id": 4}))
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Error(JsonRpcError::new(4, RpcError::new(-32000, "handler failed")))
        );
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let dispatcher = dispatcher();
        let cases = [
            (json!({"jsonrpc": "2.0", "method": "echo", "id": "x"}), 0, -32700),
            (json!({"jsonrpc": "2.0", "method": 12, "id": 5}), 5, -32700),
            (json!({"jsonrpc": "1.0", "method": "echo", "id": 6}), 6, -32600),
            (json!({"method": "echo", "id": 7}), 7, -32600),
            (json!({"jsonrpc": "2.0", "method": "nope", "id": 8}), 8, -32601),
            (json!({"jsonrpc": null, "method": "echo", "id": 9}), 9, -32600),
            (json!({"jsonrpc": "2.0", "method": null, "id": 10}), 10, -32601),
            (json!("just a string"), 0, -32600),
            (json!(17), 0, -32600),
        ];

        for (call, id, code) in cases {
            match dispatcher.process_call(call.clone()).await {
                DispatchOutcome::Error(error) => {
                    assert_eq!(error.id, id, "id for {call}");
                    assert_eq!(error.error.code, code, "code for {call}");
                }
                other => panic!("expected error for {call}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_protocol_errors_reply_even_for_notifications() {
        let dispatcher = dispatcher();

        let unknown = dispatcher
            .process_call(json!({"jsonrpc": "2.0", "method": "nope"}))
            .await;
        let bad_version = dispatcher
            .process_call(json!({"jsonrpc": "3.0", "method": "echo", "id": 0}))
            .await;

        assert!(unknown.is_error());
        assert!(bad_version.is_error());
    }

    #[tokio::test]
    async fn test_notification_invokes_handler_but_discards_outcome() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::builder()
            .register("record", Recorder { calls: Arc::clone(&calls) })
            .build();

        let absent = dispatcher
            .process_call(json!({"jsonrpc": "2.0", "method": "record", "params": [1]}))
            .await;
        let zero = dispatcher
            .process_call(json!({"jsonrpc": "2.0", "method": "record", "params": [2], "id": 0}))
            .await;

        assert_eq!(absent, DispatchOutcome::NoResponse);
        assert_eq!(zero, DispatchOutcome::NoResponse);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Some(json!([1])), Some(json!([2]))]
        );
    }

    #[tokio::test]
    async fn test_absent_only_policy_answers_id_zero() {
        let dispatcher = Dispatcher::builder()
            .notification_policy(NotificationPolicy::AbsentOnly)
            .register_fn("echo", |params| Ok(params.unwrap_or(Value::Null)))
            .build();

        let reply = dispatcher
            .handle_str(r#"{"jsonrpc":"2.0","method":"echo","params":"hi","id":0}"#)
            .await;
        assert_eq!(reply, r#"{"jsonrpc":"2.0","id":0,"result":"hi"}"#);

        let silent = dispatcher
            .handle_str(r#"{"jsonrpc":"2.0","method":"echo","params":"hi"}"#)
            .await;
        assert_eq!(silent, "");
    }

    #[tokio::test]
    async fn test_unparsable_payload() {
        let reply = dispatcher().handle_bytes(b"{not json").await;
        assert_eq!(reply, common_error_body());
    }

    #[tokio::test]
    async fn test_batch_with_non_object_element() {
        let reply = dispatcher()
            .handle_str(r#"[{"jsonrpc":"2.0","method":"echo","params":1,"id":1}, 5]"#)
            .await;

        assert_eq!(
            reply,
            r#"[{"jsonrpc":"2.0","id":1,"result":1},{"jsonrpc":"2.0","id":0,"error":{"code":-32600,"message":"Invalid Request"}}]"#
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        assert_eq!(dispatcher().handle_str("[]").await, "[]");
    }

    #[tokio::test]
    async fn test_concurrent_batch_preserves_order() {
        let dispatcher = Dispatcher::builder()
            .batch_mode(BatchMode::Concurrent)
            .register_async_fn("delay", |params| async move {
                let millis = params.as_ref().and_then(Value::as_u64).unwrap_or(0);
                tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
                Ok::<_, RpcError>(json!(millis))
            })
            .build();

        let reply = dispatcher
            .handle_str(
                r#"[{"jsonrpc":"2.0","method":"delay","params":30,"id":1},
                    {"jsonrpc":"2.0","method":"delay","params":1,"id":2}]"#,
            )
            .await;

        assert_eq!(
            reply,
            r#"[{"jsonrpc":"2.0","id":1,"result":30},{"jsonrpc":"2.0","id":2,"result":1}]"#
        );
    }

    #[tokio::test]
    async fn test_builder_from_registry_and_config() {
        let mut registry = MethodRegistry::new();
        registry.register_fn("echo", |params| Ok(params.unwrap_or(Value::Null)));

        let dispatcher = DispatcherBuilder::with_registry(registry)
            .config(DispatcherConfig {
                notification_policy: NotificationPolicy::AbsentOnly,
                batch_mode: BatchMode::Concurrent,
            })
            .build();

        assert!(dispatcher.registry().contains("echo"));
        assert_eq!(dispatcher.config().batch_mode, BatchMode::Concurrent);

        let reply = dispatcher
            .handle_value(json!({"jsonrpc": "2.0", "method": "echo", "params": [0], "id": 0}))
            .await;
        assert_eq!(reply, r#"{"jsonrpc":"2.0","id":0,"result":[0]}"#);
    }

    #[tokio::test]
    async fn test_context_reaches_every_batch_element() {
        let dispatcher = Dispatcher::builder()
            .batch_mode(BatchMode::Concurrent)
            .register_context_fn("caller", |_, context| {
                Ok(json!(context.and_then(|ctx| ctx.header("x-caller"))))
            })
            .build();
        let context = RequestContext::new().with_header("X-Caller", "billing");

        let reply = dispatcher
            .handle_bytes_with_context(
                br#"[{"jsonrpc":"2.0","method":"caller","id":1},{"jsonrpc":"2.0","method":"caller","id":2}]"#,
                &context,
            )
            .await;
        assert_eq!(
            reply,
            r#"[{"jsonrpc":"2.0","id":1,"result":"billing"},{"jsonrpc":"2.0","id":2,"result":"billing"}]"#
        );

        let without = dispatcher
            .handle_str(r#"{"jsonrpc":"2.0","method":"caller","id":3}"#)
            .await;
        assert_eq!(without, r#"{"jsonrpc":"2.0","id":3,"result":null}"#);
    }

    #[tokio::test]
    async fn test_unparsable_payload_with_context() {
        let reply = dispatcher()
            .handle_bytes_with_context(b"nope", &RequestContext::new())
            .await;
        assert_eq!(reply, common_error_body());
    }

    #[test]
    fn test_registered_methods() {
        assert_eq!(dispatcher().registered_methods(), vec!["echo", "fail"]);
    }
}
