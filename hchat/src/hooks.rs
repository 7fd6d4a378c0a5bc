//! Orchestration lifecycle hooks, keyed by the cycle's trace id.

use std::time::Duration;

use hcommon::TraceId;

use crate::{ChatError, ChatTurnResult, OrchestrationState};

pub trait OrchestrationHooks: Send + Sync {
    fn on_state_entered(&self, _trace_id: &TraceId, _state: OrchestrationState) {}

    fn on_cycle_completed(&self, _trace_id: &TraceId, _result: &ChatTurnResult, _elapsed: Duration) {
    }

    fn on_cycle_failed(&self, _trace_id: &TraceId, _error: &ChatError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOrchestrationHooks;

impl OrchestrationHooks for NoopOrchestrationHooks {}
