//! Method registry
//!
//! Handlers are stored behind the single [`RpcMethod`] capability. Closures
//! registered through [`MethodRegistry::register_fn`] or
//! [`MethodRegistry::register_async_fn`] are adapted to it before storing, so
//! every registration style dispatches the same way. Handlers that need the
//! transport request override [`RpcMethod::invoke_with_context`] or register
//! through [`MethodRegistry::register_context_fn`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::RpcError;

/// A handler for one JSON-RPC method
#[async_trait]
pub trait RpcMethod: Send + Sync {
    /// Invoke the method.
    ///
    /// `params` is passed through exactly as the caller sent it: an object,
    /// an array, a scalar, or `None` when absent or null.
    async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError>;

    /// Invoke the method with the transport request that carried the call.
    ///
    /// The dispatcher always calls this; the default ignores the context.
    async fn invoke_with_context(
        &self,
        params: Option<Value>,
        context: Option<&RequestContext>,
    ) -> Result<Value, RpcError> {
        let _ = context;
        self.invoke(params).await
    }
}

/// Adapts a synchronous closure to [`RpcMethod`]
pub struct FnMethod<F> {
    func: F,
}

impl<F> FnMethod<F>
where
    F: Fn(Option<Value>) -> Result<Value, RpcError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> RpcMethod for FnMethod<F>
where
    F: Fn(Option<Value>) -> Result<Value, RpcError> + Send + Sync,
{
    async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError> {
        (self.func)(params)
    }
}

/// Adapts a closure returning a future to [`RpcMethod`]
pub struct AsyncFnMethod<F> {
    func: F,
}

impl<F, Fut> AsyncFnMethod<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> RpcMethod for AsyncFnMethod<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
{
    async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError> {
        (self.func)(params).await
    }
}

/// Adapts a synchronous closure that also reads the [`RequestContext`]
pub struct ContextFnMethod<F> {
    func: F,
}

impl<F> ContextFnMethod<F>
where
    F: Fn(Option<Value>, Option<&RequestContext>) -> Result<Value, RpcError> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> RpcMethod for ContextFnMethod<F>
where
    F: Fn(Option<Value>, Option<&RequestContext>) -> Result<Value, RpcError> + Send + Sync,
{
    async fn invoke(&self, params: Option<Value>) -> Result<Value, RpcError> {
        (self.func)(params, None)
    }

    async fn invoke_with_context(
        &self,
        params: Option<Value>,
        context: Option<&RequestContext>,
    ) -> Result<Value, RpcError> {
        (self.func)(params, context)
    }
}

/// Mapping from method name to handler.
///
/// Registering a name twice replaces the earlier handler. There is no removal;
/// the registry is filled at startup and then frozen inside a
/// [`Dispatcher`](crate::Dispatcher).
#[derive(Default, Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn RpcMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler object
    pub fn register<M>(&mut self, name: impl Into<String>, method: M)
    where
        M: RpcMethod + 'static,
    {
        self.register_shared(name, Arc::new(method));
    }

    /// Register a synchronous closure
    pub fn register_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Option<Value>) -> Result<Value, RpcError> + Send + Sync + 'static,
    {
        self.register(name, FnMethod::new(func));
    }

    /// Register a closure returning a future
    pub fn register_async_fn<F, Fut>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        self.register(name, AsyncFnMethod::new(func));
    }

    /// Register a synchronous closure that reads the transport request
    pub fn register_context_fn<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(Option<Value>, Option<&RequestContext>) -> Result<Value, RpcError>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, ContextFnMethod::new(func));
    }

    /// Register one handler instance under several names
    pub fn register_methods<M>(&mut self, names: impl IntoIterator<Item = String>, method: M)
    where
        M: RpcMethod + 'static,
    {
        let method: Arc<dyn RpcMethod> = Arc::new(method);
        for name in names {
            self.register_shared(name, Arc::clone(&method));
        }
    }

    /// Register an already shared handler
    pub fn register_shared(&mut self, name: impl Into<String>, method: Arc<dyn RpcMethod>) {
        let name = name.into();
        if self.methods.insert(name.clone(), method).is_some() {
            debug!("Replaced method: {}", name);
        } else {
            debug!("Registered method: {}", name);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn RpcMethod>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
