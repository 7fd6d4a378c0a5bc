//! Turn requests, cycle results and the caller-facing orchestration result.

use hcommon::{Deadline, TraceId};
use hprovider::ToolResult;

use crate::{ChatError, ChatErrorKind, ChatErrorPhase};

/// One prior exchange supplied by the caller. Either side may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryTurn {
    pub user: Option<String>,
    pub ai: Option<String>,
}

impl HistoryTurn {
    pub fn new(user: impl Into<String>, ai: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ai: Some(ai.into()),
        }
    }

    pub fn user_only(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ai: None,
        }
    }

    pub fn ai_only(ai: impl Into<String>) -> Self {
        Self {
            user: None,
            ai: Some(ai.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub trace_id: Option<TraceId>,
    pub deadline: Option<Deadline>,
}

impl ChatTurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            trace_id: None,
            deadline: None,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Overrides the orchestrator's cycle timeout for this turn.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrchestrationState {
    Building,
    AwaitingFirstResponse,
    DispatchingTools,
    AwaitingSecondResponse,
    Done,
}

impl OrchestrationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::AwaitingFirstResponse => "awaiting_first_response",
            Self::DispatchingTools => "dispatching_tools",
            Self::AwaitingSecondResponse => "awaiting_second_response",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurnResult {
    pub trace_id: TraceId,
    /// Final answer. Empty when the model said nothing further.
    pub answer: String,
    pub tool_results: Vec<ToolResult>,
    /// Tool calls dropped because they lacked an id or a name.
    pub skipped_tool_calls: usize,
    pub states: Vec<OrchestrationState>,
    pub phase_two_ran: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ChatErrorKind,
    pub phase: Option<ChatErrorPhase>,
    pub tools_executed: usize,
    pub message: String,
}

impl From<&ChatError> for ErrorInfo {
    fn from(value: &ChatError) -> Self {
        Self {
            kind: value.kind,
            phase: value.phase,
            tools_executed: value.tools_executed,
            message: format!("AI assistant service error: {}", value.message),
        }
    }
}

/// Terminal output of one cycle in the shape hosts hand back to end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationResult {
    pub success: bool,
    pub answer: String,
    pub error: Option<ErrorInfo>,
}

impl OrchestrationResult {
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            success: true,
            answer: answer.into(),
            error: None,
        }
    }

    pub fn failed(error: &ChatError) -> Self {
        Self {
            success: false,
            answer: String::new(),
            error: Some(ErrorInfo::from(error)),
        }
    }

    pub fn error_kind(&self) -> Option<ChatErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }
}

impl From<Result<ChatTurnResult, ChatError>> for OrchestrationResult {
    fn from(value: Result<ChatTurnResult, ChatError>) -> Self {
        match value {
            Ok(result) => Self::answered(result.answer),
            Err(error) => Self::failed(&error),
        }
    }
}
