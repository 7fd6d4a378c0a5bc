//! Tool dispatch: argument parsing, lookup, bounded invocation, and folding
//! every failure into an error `ToolResult`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::FutureExt;
use futures_util::future::{Either, select};
use hprovider::{ToolCall, ToolDefinition, ToolResult};
use serde_json::Value;

use crate::{
    NoopToolDispatchHooks, ToolDispatchHooks, ToolError, ToolExecutionContext, ToolFuture,
    ToolRegistry, parse_json_object,
};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(15);

/// Executes validated tool calls. `execute` resolves to a `ToolResult` for
/// every input; failures are reported with `is_error = true`.
pub trait ToolDispatcher: Send + Sync {
    fn definitions(&self) -> Vec<ToolDefinition>;

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult>;
}

#[derive(Clone)]
pub struct DefaultToolDispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
    hooks: Arc<dyn ToolDispatchHooks>,
}

impl Default for DefaultToolDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl std::fmt::Debug for DefaultToolDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultToolDispatcher")
            .field("registry", &self.registry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DefaultToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: DEFAULT_TOOL_TIMEOUT,
            hooks: Arc::new(NoopToolDispatchHooks),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolDispatchHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_execute(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<Value, ToolError> {
        let args = parse_json_object(&tool_call.arguments)?;
        let tool = self.registry.handler_for(&tool_call.name)?;

        let budget = context
            .deadline
            .map_or(self.timeout, |deadline| deadline.clamp(self.timeout));
        if budget.is_zero() {
            return Err(ToolError::timeout("deadline expired before dispatch"));
        }

        let invocation = AssertUnwindSafe(async { tool.invoke(args, context).await }).catch_unwind();

        match select(Box::pin(invocation), Delay::new(budget)).await {
            Either::Left((Ok(outcome), _)) => outcome,
            Either::Left((Err(panic), _)) => Err(ToolError::execution(format!(
                "tool panicked: {}",
                panic_message(panic.as_ref())
            ))),
            Either::Right(_) => Err(ToolError::timeout(format!(
                "tool did not finish within {}ms",
                budget.as_millis()
            ))),
        }
    }
}

impl ToolDispatcher for DefaultToolDispatcher {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.describe()
    }

    fn execute<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolResult> {
        Box::pin(async move {
            self.hooks.on_dispatch_start(&tool_call, &context);
            let started = Instant::now();

            match self.try_execute(&tool_call, &context).await {
                Ok(output) => {
                    let result = ToolResult::success(tool_call.id.clone(), output.to_string());
                    self.hooks
                        .on_dispatch_success(&tool_call, &context, &result, started.elapsed());
                    result
                }
                Err(error) => {
                    let error = error
                        .with_tool_name(tool_call.name.clone())
                        .with_tool_call_id(tool_call.id.clone());
                    self.hooks
                        .on_dispatch_failure(&tool_call, &context, &error, started.elapsed());
                    ToolResult::error(tool_call.id.clone(), error.to_payload().to_string())
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
