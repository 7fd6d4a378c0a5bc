//! `metrics` counters and histograms, all prefixed `hakim_`.
//!
//! ```rust
//! use hobserve::MetricsObservabilityHooks;
//! use hprovider::ProviderOperationHooks;
//!
//! fn accepts_provider_hooks(_hooks: &dyn ProviderOperationHooks) {}
//!
//! accepts_provider_hooks(&MetricsObservabilityHooks);
//! ```

use std::time::Duration;

use hchat::{ChatError, ChatTurnResult, OrchestrationHooks, OrchestrationState};
use hcommon::TraceId;
use hprovider::{ProviderError, ProviderId, ProviderOperation, ProviderOperationHooks, ToolCall, ToolResult};
use htooling::{ToolDispatchHooks, ToolError, ToolExecutionContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ProviderOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, provider: ProviderId, operation: ProviderOperation, _attempt: u32) {
        metrics::counter!(
            "hakim_provider_attempts_total",
            "provider" => provider.to_string(),
            "operation" => operation.as_str()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "hakim_provider_retries_total",
            "provider" => provider.to_string(),
            "operation" => operation.as_str(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "hakim_provider_retry_delay_seconds",
            "provider" => provider.to_string(),
            "operation" => operation.as_str()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, provider: ProviderId, operation: ProviderOperation, attempts: u32) {
        metrics::counter!(
            "hakim_provider_calls_total",
            "provider" => provider.to_string(),
            "operation" => operation.as_str(),
            "outcome" => "success"
        )
        .increment(1);
        metrics::histogram!(
            "hakim_provider_attempts_per_call",
            "provider" => provider.to_string(),
            "operation" => operation.as_str()
        )
        .record(f64::from(attempts));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "hakim_provider_calls_total",
            "provider" => provider.to_string(),
            "operation" => operation.as_str(),
            "outcome" => "failure",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "hakim_provider_attempts_per_call",
            "provider" => provider.to_string(),
            "operation" => operation.as_str()
        )
        .record(f64::from(attempts));
    }
}

impl ToolDispatchHooks for MetricsObservabilityHooks {
    fn on_dispatch_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "hakim_tool_dispatches_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        elapsed: Duration,
    ) {
        metrics::histogram!(
            "hakim_tool_dispatch_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "outcome" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "hakim_tool_dispatch_errors_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "hakim_tool_dispatch_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "outcome" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl OrchestrationHooks for MetricsObservabilityHooks {
    fn on_state_entered(&self, _trace_id: &TraceId, state: OrchestrationState) {
        metrics::counter!("hakim_cycle_states_total", "state" => state.as_str()).increment(1);
    }

    fn on_cycle_completed(&self, _trace_id: &TraceId, result: &ChatTurnResult, elapsed: Duration) {
        let phases = if result.phase_two_ran { "two" } else { "one" };
        metrics::counter!("hakim_cycles_total", "outcome" => "success", "phases" => phases)
            .increment(1);
        metrics::histogram!("hakim_cycle_duration_seconds", "outcome" => "success")
            .record(elapsed.as_secs_f64());
        metrics::histogram!("hakim_cycle_tool_calls").record(result.tool_results.len() as f64);
    }

    fn on_cycle_failed(&self, _trace_id: &TraceId, error: &ChatError, elapsed: Duration) {
        metrics::counter!(
            "hakim_cycles_total",
            "outcome" => "failure",
            "error_kind" => error.kind.as_str(),
            "error_phase" => error.phase.map_or("none", |phase| phase.as_str())
        )
        .increment(1);
        metrics::histogram!("hakim_cycle_duration_seconds", "outcome" => "failure")
            .record(elapsed.as_secs_f64());
    }
}
