//! Common imports for hakim hosts.

pub use crate::{
    ChatError, ChatErrorKind, ChatTurnRequest, ChatTurnResult, ConversationOrchestrator,
    DiagnosisReport, DiagnosisRequest, DiagnosisRequester, HakimConfig, HakimError, HakimRuntime,
    HistoryTurn, Message, ModelProvider, OrchestrationResult, ProviderError, Tool, ToolCall,
    ToolDefinition, ToolError, ToolExecutionContext, ToolFuture, ToolRegistry, build_runtime_with,
    init_logging,
};
#[cfg(feature = "provider-dashscope")]
pub use crate::{build_runtime, dashscope_provider};
