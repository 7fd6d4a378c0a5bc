//! Panic-isolating wrappers. A hook that panics is skipped; the cycle that
//! called it carries on.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use hchat::{ChatError, ChatTurnResult, OrchestrationHooks, OrchestrationState};
use hcommon::TraceId;
use hprovider::{ProviderError, ProviderId, ProviderOperation, ProviderOperationHooks, ToolCall, ToolResult};
use htooling::{ToolDispatchHooks, ToolError, ToolExecutionContext};

fn guarded(callback: impl FnOnce()) {
    let _ = catch_unwind(AssertUnwindSafe(callback));
}

#[derive(Debug, Clone, Default)]
pub struct SafeProviderHooks<H> {
    inner: H,
}

impl<H> SafeProviderHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: ProviderOperationHooks> ProviderOperationHooks for SafeProviderHooks<H> {
    fn on_attempt_start(&self, provider: ProviderId, operation: ProviderOperation, attempt: u32) {
        guarded(|| self.inner.on_attempt_start(provider, operation, attempt));
    }

    fn on_retry_scheduled(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        guarded(|| {
            self.inner
                .on_retry_scheduled(provider, operation, attempt, delay, error)
        });
    }

    fn on_success(&self, provider: ProviderId, operation: ProviderOperation, attempts: u32) {
        guarded(|| self.inner.on_success(provider, operation, attempts));
    }

    fn on_failure(
        &self,
        provider: ProviderId,
        operation: ProviderOperation,
        attempts: u32,
        error: &ProviderError,
    ) {
        guarded(|| self.inner.on_failure(provider, operation, attempts, error));
    }
}

#[derive(Debug, Clone, Default)]
pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: ToolDispatchHooks> ToolDispatchHooks for SafeToolHooks<H> {
    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        guarded(|| self.inner.on_dispatch_start(tool_call, context));
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolResult,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_dispatch_success(tool_call, context, result, elapsed)
        });
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        guarded(|| {
            self.inner
                .on_dispatch_failure(tool_call, context, error, elapsed)
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct SafeOrchestrationHooks<H> {
    inner: H,
}

impl<H> SafeOrchestrationHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: OrchestrationHooks> OrchestrationHooks for SafeOrchestrationHooks<H> {
    fn on_state_entered(&self, trace_id: &TraceId, state: OrchestrationState) {
        guarded(|| self.inner.on_state_entered(trace_id, state));
    }

    fn on_cycle_completed(&self, trace_id: &TraceId, result: &ChatTurnResult, elapsed: Duration) {
        guarded(|| self.inner.on_cycle_completed(trace_id, result, elapsed));
    }

    fn on_cycle_failed(&self, trace_id: &TraceId, error: &ChatError, elapsed: Duration) {
        guarded(|| self.inner.on_cycle_failed(trace_id, error, elapsed));
    }
}
