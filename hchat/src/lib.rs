//! Tool-augmented conversation orchestration over model providers.
//!
//! A cycle asks the model once with the registered tools attached, runs any
//! tool calls it requested, and asks again with the tool results to get the
//! final answer. [`DiagnosisRequester`] is the single-call sibling used for
//! structured JSON replies.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hchat::ConversationOrchestrator;
//! use hprovider::{
//!     BoxedResponseStream, ModelProvider, ModelRequest, ModelResponse, ProviderError,
//!     ProviderFuture, ProviderId, ResponseMessage, VecResponseStream,
//! };
//! use htooling::{DefaultToolDispatcher, ToolRegistry};
//!
//! struct Scripted;
//!
//! impl ModelProvider for Scripted {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::DashScope
//!     }
//!
//!     fn complete<'a>(
//!         &'a self,
//!         _request: ModelRequest,
//!     ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
//!         Box::pin(async { Err(ProviderError::other("streaming only")) })
//!     }
//!
//!     fn stream<'a>(
//!         &'a self,
//!         _request: ModelRequest,
//!     ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>> {
//!         Box::pin(async {
//!             let increments = vec![
//!                 Ok(ModelResponse::from_message(ResponseMessage::text("多喝"))),
//!                 Ok(ModelResponse::from_message(ResponseMessage::text("多喝水，注意休息。"))),
//!             ];
//!             Ok(Box::pin(VecResponseStream::new(increments)) as BoxedResponseStream<'a>)
//!         })
//!     }
//! }
//!
//! let orchestrator = ConversationOrchestrator::new(
//!     Arc::new(Scripted),
//!     Arc::new(DefaultToolDispatcher::new(Arc::new(ToolRegistry::new()))),
//! );
//!
//! let result = block_on(orchestrator.orchestrate("感冒了怎么办？", Vec::new()));
//! assert!(result.success);
//! assert_eq!(result.answer, "多喝水，注意休息。");
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

mod deadline;
mod diagnosis;
mod error;
mod hooks;
mod json;
mod orchestrator;
mod prompts;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatErrorPhase, ChatTurnRequest, ChatTurnResult,
        ConversationOrchestrator, ConversationOrchestratorBuilder, DiagnosisReport,
        DiagnosisRequest, DiagnosisRequester, HistoryTurn, OrchestrationHooks,
        OrchestrationResult, OrchestrationState,
    };
    pub use hcommon::{Deadline, TraceId};
}

pub use diagnosis::{
    Diagnosis, DiagnosisReport, DiagnosisRequest, DiagnosisRequester, PossibleDisease,
    Recommendations, parse_diagnosis,
};
pub use error::{ChatError, ChatErrorKind, ChatErrorPhase};
pub use hooks::{NoopOrchestrationHooks, OrchestrationHooks};
pub use json::extract_json_object;
pub use orchestrator::{
    ConversationOrchestrator, ConversationOrchestratorBuilder, DEFAULT_CYCLE_TIMEOUT,
    DEFAULT_MODEL, DEFAULT_SEED,
};
pub use prompts::{DEFAULT_SYSTEM_PROMPT, DIAGNOSIS_SYSTEM_PROMPT, diagnosis_user_prompt};
pub use types::{
    ChatTurnRequest, ChatTurnResult, ErrorInfo, HistoryTurn, OrchestrationResult,
    OrchestrationState,
};
