//! Structured `tracing` events for every hook callback.
//!
//! Events carry `phase` (`provider`, `tool` or `cycle`) and `event` fields so
//! a subscriber can filter on them.

use std::time::Duration;

use hchat::{ChatError, ChatTurnResult, OrchestrationHooks, OrchestrationState};
use hcommon::TraceId;
use hprovider::{ProviderError, ProviderId, ProviderOperation, ProviderOperationHooks, ToolCall, ToolResult};
use htooling::{ToolDispatchHooks, ToolError, ToolExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

fn trace_of(context: &ToolExecutionContext) -> Option<&str> {
    context.trace_id.as_ref().map(TraceId::as_str)
}

impl ProviderOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: ProviderOperation, attempt: u32) {
        tracing::debug!(
            phase = "provider",
            event = "attempt_start",
            provider = %provider,
            operation = operation.as_str(),
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "provider",
            event = "retry_scheduled",
            provider = %provider,
            operation = operation.as_str(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            status = error.status,
            error = %error
        );
    }

    fn on_success(&self, provider: ProviderId, operation: ProviderOperation, attempts: u32) {
        tracing::info!(
            phase = "provider",
            event = "success",
            provider = %provider,
            operation = operation.as_str(),
            attempts
        );
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "provider",
            event = "failure",
            provider = %provider,
            operation = operation.as_str(),
            attempts,
            error_kind = ?error.kind,
            status = error.status,
            error = %error
        );
    }
}

impl ToolDispatchHooks for TracingObservabilityHooks {
    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "dispatch_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            trace_id = trace_of(context)
        );
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "dispatch_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            trace_id = trace_of(context),
            content_bytes = result.content.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        // Folded into the transcript, so a warning rather than an error.
        tracing::warn!(
            phase = "tool",
            event = "dispatch_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            trace_id = trace_of(context),
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}

impl OrchestrationHooks for TracingObservabilityHooks {
    fn on_state_entered(&self, trace_id: &TraceId, state: OrchestrationState) {
        tracing::debug!(
            phase = "cycle",
            event = "state_entered",
            trace_id = trace_id.as_str(),
            state = state.as_str()
        );
    }

    fn on_cycle_completed(&self, trace_id: &TraceId, result: &ChatTurnResult, elapsed: Duration) {
        tracing::info!(
            phase = "cycle",
            event = "completed",
            trace_id = trace_id.as_str(),
            tools_executed = result.tool_results.len(),
            tool_errors = result.tool_results.iter().filter(|result| result.is_error).count(),
            skipped_tool_calls = result.skipped_tool_calls,
            phase_two_ran = result.phase_two_ran,
            answer_chars = result.answer.chars().count(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_cycle_failed(&self, trace_id: &TraceId, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "cycle",
            event = "failed",
            trace_id = trace_id.as_str(),
            error_kind = error.kind.as_str(),
            error_phase = error.phase.map(|phase| phase.as_str()),
            tools_executed = error.tools_executed,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error
        );
    }
}
