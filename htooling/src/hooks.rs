//! Dispatch lifecycle hooks.
//!
//! ```rust
//! use htooling::{NoopToolDispatchHooks, ToolDispatchHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolDispatchHooks) {}
//!
//! assert_hooks_trait(&NoopToolDispatchHooks);
//! ```

use std::time::Duration;

use hprovider::{ToolCall, ToolResult};

use crate::{ToolError, ToolExecutionContext};

pub trait ToolDispatchHooks: Send + Sync {
    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        _elapsed: Duration,
    ) {
    }

    /// Called for failures that were folded into an error `ToolResult`.
    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolDispatchHooks;

impl ToolDispatchHooks for NoopToolDispatchHooks {}
