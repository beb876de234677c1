//! Tool registry.
//!
//! Maps a tool name to a handler plus the descriptor advertised to the model.
//! Handlers are uniform async tasks ([`ToolHandler`]); synchronous closures
//! are wrapped by [`FnTool`] and future-returning closures by
//! [`AsyncFnTool`], so the turn loop awaits every tool through one call path.
//!
//! # Example
//!
//! ```rust
//! # use clawd_agent::tools::{ToolArgs, ToolRegistry};
//! let mut registry = ToolRegistry::new();
//! registry.register_fn("get_time", "Get current time", None, |_args: ToolArgs| {
//!     Ok("12:00:00".to_owned())
//! });
//!
//! assert_eq!(registry.len(), 1);
//! assert_eq!(registry.descriptors()[0].name(), "get_time");
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::ToolError;
use crate::llm::types::ToolDescriptor;

/// Keyword arguments decoded from a tool call.
pub type ToolArgs = Map<String, Value>;

// ---------------------------------------------------------------------------
// Handler abstraction
// ---------------------------------------------------------------------------

/// Something the agent can invoke by name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool.  The result is always text for the model.
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError>;
}

/// Wraps a synchronous closure as a [`ToolHandler`].
pub struct FnTool<F>(pub F);

#[async_trait]
impl<F> ToolHandler for FnTool<F>
where
    F: Fn(ToolArgs) -> Result<String, ToolError> + Send + Sync,
{
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        (self.0)(args)
    }
}

/// Wraps a closure returning a future as a [`ToolHandler`].
pub struct AsyncFnTool<F>(pub F);

#[async_trait]
impl<F, Fut> ToolHandler for AsyncFnTool<F>
where
    F: Fn(ToolArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, ToolError>> + Send,
{
    async fn call(&self, args: ToolArgs) -> Result<String, ToolError> {
        (self.0)(args).await
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The schema used when a tool is registered without one.
pub fn empty_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Name -> handler dispatch map plus the ordered descriptor list.
///
/// Both views are updated together by [`ToolRegistry::register`]; re-using a
/// name replaces the handler and the descriptor in place.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`.  The last registration for a name wins.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
        parameters: Option<Value>,
    ) {
        let name = name.into();
        let descriptor = ToolDescriptor::function(
            name.clone(),
            description,
            parameters.unwrap_or_else(empty_parameters),
        );

        match self.descriptors.iter_mut().find(|d| d.name() == name) {
            Some(existing) => {
                tracing::info!(tool = %name, "tool re-registered");
                *existing = descriptor;
            }
            None => {
                tracing::debug!(tool = %name, "tool registered");
                self.descriptors.push(descriptor);
            }
        }
        self.handlers.insert(name, handler);
    }

    /// Register a synchronous closure.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Option<Value>,
        f: F,
    ) where
        F: Fn(ToolArgs) -> Result<String, ToolError> + Send + Sync + 'static,
    {
        self.register(name, description, Arc::new(FnTool(f)), parameters);
    }

    /// Register a closure returning a future.
    pub fn register_async<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Option<Value>,
        f: F,
    ) where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
    {
        self.register(name, description, Arc::new(AsyncFnTool(f)), parameters);
    }

    /// Look up a handler by name.
    pub fn handler(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Descriptors in registration order, ready for the request body.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(ToolDescriptor::name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Extract a required string argument.
pub fn require_str<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidArgument {
            name: name.to_owned(),
            reason: format!("expected a string, got {other}"),
        }),
        None => Err(ToolError::MissingArgument(name.to_owned())),
    }
}

/// Extract an optional string argument.
pub fn optional_str<'a>(args: &'a ToolArgs, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
