//! Tool registry keyed by tool name.
//!
//! Populated once at startup, then shared read-only behind an `Arc`.
//!
//! ```rust
//! use hprovider::ToolDefinition;
//! use htooling::{ToolErrorKind, ToolRegistry};
//! use serde_json::json;
//!
//! let mut registry = ToolRegistry::new();
//! let definition = ToolDefinition::new("ping", "Health check");
//! registry
//!     .register_sync_fn(definition.clone(), |_args, _ctx| Ok(json!({"pong": true})))
//!     .expect("first registration succeeds");
//!
//! let duplicate = registry
//!     .register_sync_fn(definition, |_args, _ctx| Ok(json!({})))
//!     .expect_err("names are unique");
//! assert_eq!(duplicate.kind, ToolErrorKind::AlreadyRegistered);
//! assert_eq!(registry.describe().len(), 1);
//! ```

use std::future::Future;
use std::sync::Arc;

use hcommon::Registry;
use hprovider::ToolDefinition;
use serde_json::{Map, Value};

use crate::{FunctionTool, Tool, ToolError, ToolExecutionContext};

#[derive(Default)]
pub struct ToolRegistry {
    tools: Registry<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self, tool: T) -> Result<(), ToolError>
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(ToolError::invalid_arguments("tool name must not be empty"));
        }

        if !self.tools.insert_new(name.clone(), Arc::new(tool)) {
            return Err(ToolError::already_registered(name));
        }

        Ok(())
    }

    pub fn register_fn<F, Fut>(
        &mut self,
        definition: ToolDefinition,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(Map<String, Value>, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        self.register(FunctionTool::new(definition, handler))
    }

    pub fn register_sync_fn<F>(
        &mut self,
        definition: ToolDefinition,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(Map<String, Value>, ToolExecutionContext) -> Result<Value, ToolError>
            + Send
            + Sync
            + 'static,
    {
        self.register_fn(definition, move |args, context| {
            let output = handler(args, context);
            async move { output }
        })
    }

    /// Definitions of every registered tool, ordered by name.
    pub fn describe(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn handler_for(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.get(name).ok_or_else(|| ToolError::unknown_tool(name))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
