//! Tool trait contract for registry-managed capabilities.
//!
//! ```rust
//! use hprovider::ToolDefinition;
//! use htooling::{FunctionTool, Tool};
//! use serde_json::Value;
//!
//! let tool = FunctionTool::new(
//!     ToolDefinition::new("echo", "Echoes its arguments"),
//!     |args, _ctx| async move { Ok(Value::Object(args)) },
//! );
//!
//! assert_eq!(tool.definition().name, "echo");
//! ```

use std::future::Future;
use std::sync::Arc;

use hcommon::BoxFuture;
use hprovider::ToolDefinition;
use serde_json::{Map, Value};

use crate::{ToolError, ToolExecutionContext};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

/// A named handler. Arguments arrive already parsed into a JSON object and
/// the output must be JSON-encodable.
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn invoke<'a>(
        &'a self,
        args: Map<String, Value>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>>;
}

type ToolHandler = dyn Fn(Map<String, Value>, ToolExecutionContext) -> ToolFuture<'static, Result<Value, ToolError>>
    + Send
    + Sync;

pub struct FunctionTool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    pub fn new<F, Fut>(definition: ToolDefinition, handler: F) -> Self
    where
        F: Fn(Map<String, Value>, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> =
            Arc::new(move |args, context| Box::pin(handler(args, context)));

        Self {
            definition,
            handler,
        }
    }
}

impl Tool for FunctionTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    fn invoke<'a>(
        &'a self,
        args: Map<String, Value>,
        context: &'a ToolExecutionContext,
    ) -> ToolFuture<'a, Result<Value, ToolError>> {
        (self.handler)(args, context.clone())
    }
}
