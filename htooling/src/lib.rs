//! Tool layer: registration, argument helpers, and never-failing dispatch.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hprovider::{ToolCall, ToolDefinition};
//! use htooling::{
//!     DefaultToolDispatcher, ToolDispatcher, ToolExecutionContext, ToolRegistry, required_string,
//! };
//! use serde_json::json;
//!
//! let mut registry = ToolRegistry::new();
//! registry
//!     .register_sync_fn(
//!         ToolDefinition::new("greet", "Greets someone")
//!             .with_parameter("name", "string", "Who to greet", true),
//!         |args, _ctx| Ok(json!({ "greeting": format!("你好, {}", required_string(&args, "name")?) })),
//!     )
//!     .expect("registration succeeds");
//!
//! let dispatcher = DefaultToolDispatcher::new(Arc::new(registry));
//! let call = ToolCall {
//!     id: "call_1".to_string(),
//!     name: "greet".to_string(),
//!     arguments: r#"{"name":"王"}"#.to_string(),
//! };
//!
//! let result = block_on(dispatcher.execute(call, ToolExecutionContext::new()));
//! assert!(!result.is_error);
//! assert_eq!(result.content, r#"{"greeting":"你好, 王"}"#);
//! # fn block_on<F: std::future::Future>(future: F) -> F::Output {
//! #     let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
//! #     let mut future = std::pin::pin!(future);
//! #     loop {
//! #         if let std::task::Poll::Ready(value) = future.as_mut().poll(&mut cx) {
//! #             return value;
//! #         }
//! #     }
//! # }
//! ```

mod args;
mod dispatcher;
mod error;
mod hooks;
mod registry;
mod tool;
mod types;

pub mod prelude {
    pub use crate::{
        DefaultToolDispatcher, FunctionTool, Tool, ToolDispatchHooks, ToolDispatcher, ToolError,
        ToolErrorKind, ToolExecutionContext, ToolFuture, ToolRegistry,
    };
}

pub use args::{optional_string, parse_json_object, parse_json_value, required_string};
pub use dispatcher::{DEFAULT_TOOL_TIMEOUT, DefaultToolDispatcher, ToolDispatcher};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolDispatchHooks, ToolDispatchHooks};
pub use registry::ToolRegistry;
pub use tool::{FunctionTool, Tool, ToolFuture};
pub use types::ToolExecutionContext;
