//! Common `hprovider` imports for downstream crates.

pub use crate::{
    BoxedResponseStream, Message, ModelProvider, ModelRequest, ModelRequestBuilder, ModelResponse,
    NoopOperationHooks, ProviderError, ProviderErrorKind, ProviderId, ProviderOperation,
    ProviderOperationHooks, ResponseMessage, RetryPolicy, Role, StreamAccumulator, StreamSnapshot,
    ToolCall, ToolCallRequest, ToolDefinition, ToolResult, VecResponseStream, collect_stream,
    execute_with_retry,
};
pub use hcommon::{BoxFuture, GenerationOptions};
