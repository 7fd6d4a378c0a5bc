//! Per-dispatch execution context.

use hcommon::{Deadline, TraceId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolExecutionContext {
    pub trace_id: Option<TraceId>,
    pub deadline: Option<Deadline>,
}

impl ToolExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
