use std::sync::{Arc, Mutex};
use std::time::Duration;

use hchat::{ChatError, ChatErrorPhase, ChatTurnResult, OrchestrationHooks, OrchestrationState};
use hcommon::TraceId;
use hprovider::{
    ProviderError, ProviderId, ProviderOperation, ProviderOperationHooks, ToolCall, ToolResult,
};
use htooling::{ToolDispatchHooks, ToolError, ToolExecutionContext};

use crate::{
    MetricsObservabilityHooks, SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};

fn weather_call() -> ToolCall {
    ToolCall {
        id: "call_1".to_string(),
        name: "amap_weather".to_string(),
        arguments: "{\"location\":\"海淀区\"}".to_string(),
    }
}

fn tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new().with_trace_id("cycle-1")
}

fn turn_result() -> ChatTurnResult {
    ChatTurnResult {
        trace_id: TraceId::new("cycle-1"),
        answer: "海淀区今天晴。".to_string(),
        tool_results: vec![ToolResult::success("call_1", "{\"weather\":\"晴\"}")],
        skipped_tool_calls: 0,
        states: vec![OrchestrationState::Building, OrchestrationState::Done],
        phase_two_ran: true,
    }
}

fn second_phase_error() -> ChatError {
    ChatError::transport("endpoint returned status 503")
        .with_phase(ChatErrorPhase::SecondResponse)
        .with_tools_executed(1)
}

fn exercise_provider_hooks(hooks: &dyn ProviderOperationHooks) {
    let error = ProviderError::status(503, None);
    hooks.on_attempt_start(ProviderId::DashScope, ProviderOperation::Stream, 1);
    hooks.on_retry_scheduled(
        ProviderId::DashScope,
        ProviderOperation::Stream,
        1,
        Duration::from_millis(200),
        &error,
    );
    hooks.on_success(ProviderId::DashScope, ProviderOperation::Stream, 2);
    hooks.on_failure(ProviderId::DashScope, ProviderOperation::Complete, 3, &error);
}

fn exercise_tool_hooks(hooks: &dyn ToolDispatchHooks) {
    hooks.on_dispatch_start(&weather_call(), &tool_context());
    hooks.on_dispatch_success(
        &weather_call(),
        &tool_context(),
        &ToolResult::success("call_1", "{}"),
        Duration::from_millis(12),
    );
    hooks.on_dispatch_failure(
        &weather_call(),
        &tool_context(),
        &ToolError::timeout("tool did not finish within 15000ms"),
        Duration::from_secs(15),
    );
}

fn exercise_orchestration_hooks(hooks: &dyn OrchestrationHooks) {
    let trace_id = TraceId::new("cycle-1");
    hooks.on_state_entered(&trace_id, OrchestrationState::AwaitingFirstResponse);
    hooks.on_cycle_completed(&trace_id, &turn_result(), Duration::from_millis(900));
    hooks.on_cycle_failed(&trace_id, &second_phase_error(), Duration::from_millis(400));
}

#[test]
fn tracing_hooks_handle_every_callback() {
    exercise_provider_hooks(&TracingObservabilityHooks);
    exercise_tool_hooks(&TracingObservabilityHooks);
    exercise_orchestration_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_handle_every_callback_without_recorder() {
    exercise_provider_hooks(&MetricsObservabilityHooks);
    exercise_tool_hooks(&MetricsObservabilityHooks);
    exercise_orchestration_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn push(&self, event: impl Into<String>) {
        self.events.lock().expect("events lock").push(event.into());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock().expect("events lock"))
    }
}

impl ProviderOperationHooks for Recorder {
    fn on_attempt_start(&self, _provider: ProviderId, operation: ProviderOperation, attempt: u32) {
        self.push(format!("attempt:{operation}:{attempt}"));
    }

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: ProviderOperation,
        _attempt: u32,
        delay: Duration,
        _error: &ProviderError,
    ) {
        self.push(format!("retry:{}", delay.as_millis()));
    }

    fn on_success(&self, _provider: ProviderId, _operation: ProviderOperation, attempts: u32) {
        self.push(format!("success:{attempts}"));
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        operation: ProviderOperation,
        _attempts: u32,
        error: &ProviderError,
    ) {
        self.push(format!("failure:{operation}:{:?}", error.kind));
    }
}

impl ToolDispatchHooks for Recorder {
    fn on_dispatch_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push(format!("start:{}", tool_call.name));
    }

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        result: &ToolResult,
        _elapsed: Duration,
    ) {
        self.push(format!("success:{}", result.tool_call_id));
    }

    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push(format!("failure:{:?}", error.kind));
    }
}

impl OrchestrationHooks for Recorder {
    fn on_state_entered(&self, trace_id: &TraceId, state: OrchestrationState) {
        self.push(format!("{trace_id}:{}", state.as_str()));
    }

    fn on_cycle_completed(&self, trace_id: &TraceId, result: &ChatTurnResult, _elapsed: Duration) {
        self.push(format!("{trace_id}:completed:{}", result.tool_results.len()));
    }

    fn on_cycle_failed(&self, trace_id: &TraceId, error: &ChatError, _elapsed: Duration) {
        self.push(format!("{trace_id}:failed:{}", error.kind.as_str()));
    }
}

#[test]
fn safe_wrappers_delegate_in_order() {
    let recorder = Recorder::default();

    exercise_provider_hooks(&SafeProviderHooks::new(recorder.clone()));
    assert_eq!(
        recorder.take(),
        vec!["attempt:stream:1", "retry:200", "success:2", "failure:complete:Unavailable"]
    );

    exercise_tool_hooks(&SafeToolHooks::new(recorder.clone()));
    assert_eq!(
        recorder.take(),
        vec!["start:amap_weather", "success:call_1", "failure:Timeout"]
    );

    exercise_orchestration_hooks(&SafeOrchestrationHooks::new(recorder.clone()));
    assert_eq!(
        recorder.take(),
        vec![
            "cycle-1:awaiting_first_response",
            "cycle-1:completed:1",
            "cycle-1:failed:transport",
        ]
    );
}

struct Exploding;

impl ProviderOperationHooks for Exploding {
    fn on_attempt_start(&self, _provider: ProviderId, _operation: ProviderOperation, _attempt: u32) {
        panic!("attempt hook");
    }

    fn on_retry_scheduled(
        &self,
        _provider: ProviderId,
        _operation: ProviderOperation,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        panic!("retry hook");
    }

    fn on_success(&self, _provider: ProviderId, _operation: ProviderOperation, _attempts: u32) {
        panic!("success hook");
    }

    fn on_failure(
        &self,
        _provider: ProviderId,
        _operation: ProviderOperation,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        panic!("failure hook");
    }
}

impl ToolDispatchHooks for Exploding {
    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start hook");
    }

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolResult,
        _elapsed: Duration,
    ) {
        panic!("success hook");
    }

    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        panic!("failure hook");
    }
}

impl OrchestrationHooks for Exploding {
    fn on_state_entered(&self, _trace_id: &TraceId, _state: OrchestrationState) {
        panic!("state hook");
    }

    fn on_cycle_completed(&self, _trace_id: &TraceId, _result: &ChatTurnResult, _elapsed: Duration) {
        panic!("completed hook");
    }

    fn on_cycle_failed(&self, _trace_id: &TraceId, _error: &ChatError, _elapsed: Duration) {
        panic!("failed hook");
    }
}

#[test]
fn safe_wrappers_swallow_panics() {
    exercise_provider_hooks(&SafeProviderHooks::new(Exploding));
    exercise_tool_hooks(&SafeToolHooks::new(Exploding));
    exercise_orchestration_hooks(&SafeOrchestrationHooks::new(Exploding));
}
