//! Two-phase conversation cycle: ask the model, run the tools it requested,
//! then ask again for the final answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use hcommon::{Deadline, GenerationOptions, TraceId};
use hprovider::{
    Message, ModelProvider, ModelRequest, NoopOperationHooks, ProviderOperation,
    ProviderOperationHooks, RetryPolicy, StreamSnapshot, ToolCall, ToolCallRequest, ToolDefinition,
    ToolResult, collect_stream, execute_with_retry,
};
use htooling::{ToolDispatcher, ToolExecutionContext};

use crate::deadline::within_deadline;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::{
    ChatError, ChatErrorPhase, ChatTurnRequest, ChatTurnResult, HistoryTurn,
    NoopOrchestrationHooks, OrchestrationHooks, OrchestrationResult, OrchestrationState,
};

pub const DEFAULT_MODEL: &str = "qwen-max";
pub const DEFAULT_SEED: u64 = 1234;
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs orchestration cycles. Holds no per-cycle state, so one instance can
/// serve concurrent turns.
#[derive(Clone)]
pub struct ConversationOrchestrator {
    provider: Arc<dyn ModelProvider>,
    dispatcher: Arc<dyn ToolDispatcher>,
    model: String,
    system_prompt: String,
    options: GenerationOptions,
    retry_policy: RetryPolicy,
    cycle_timeout: Option<Duration>,
    hooks: Arc<dyn OrchestrationHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

impl std::fmt::Debug for ConversationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationOrchestrator")
            .field("provider", &self.provider.id())
            .field("model", &self.model)
            .field("options", &self.options)
            .field("retry_policy", &self.retry_policy)
            .field("cycle_timeout", &self.cycle_timeout)
            .finish_non_exhaustive()
    }
}

pub struct ConversationOrchestratorBuilder {
    provider: Arc<dyn ModelProvider>,
    dispatcher: Arc<dyn ToolDispatcher>,
    model: String,
    system_prompt: String,
    options: GenerationOptions,
    retry_policy: RetryPolicy,
    cycle_timeout: Option<Duration>,
    hooks: Arc<dyn OrchestrationHooks>,
    provider_hooks: Arc<dyn ProviderOperationHooks>,
}

impl ConversationOrchestratorBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>, dispatcher: Arc<dyn ToolDispatcher>) -> Self {
        Self {
            provider,
            dispatcher,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            options: GenerationOptions::default().with_seed(DEFAULT_SEED),
            retry_policy: RetryPolicy::default(),
            cycle_timeout: Some(DEFAULT_CYCLE_TIMEOUT),
            hooks: Arc::new(NoopOrchestrationHooks),
            provider_hooks: Arc::new(NoopOperationHooks),
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Replaces the generation options. Streaming is forced on per call.
    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Default bound for a whole cycle; `None` disables it.
    pub fn cycle_timeout(mut self, cycle_timeout: Option<Duration>) -> Self {
        self.cycle_timeout = cycle_timeout;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn OrchestrationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn provider_hooks(mut self, provider_hooks: Arc<dyn ProviderOperationHooks>) -> Self {
        self.provider_hooks = provider_hooks;
        self
    }

    pub fn build(self) -> ConversationOrchestrator {
        ConversationOrchestrator {
            provider: self.provider,
            dispatcher: self.dispatcher,
            model: self.model,
            system_prompt: self.system_prompt,
            options: self.options,
            retry_policy: self.retry_policy,
            cycle_timeout: self.cycle_timeout,
            hooks: self.hooks,
            provider_hooks: self.provider_hooks,
        }
    }
}

/// State path of one cycle, mirrored to the hooks as it is walked.
struct Cycle<'a> {
    trace_id: &'a TraceId,
    hooks: &'a dyn OrchestrationHooks,
    states: Vec<OrchestrationState>,
}

impl<'a> Cycle<'a> {
    fn new(trace_id: &'a TraceId, hooks: &'a dyn OrchestrationHooks) -> Self {
        Self {
            trace_id,
            hooks,
            states: Vec::with_capacity(5),
        }
    }

    fn enter(&mut self, state: OrchestrationState) {
        self.states.push(state);
        self.hooks.on_state_entered(self.trace_id, state);
    }
}

struct CycleOutput {
    answer: String,
    tool_results: Vec<ToolResult>,
    skipped_tool_calls: usize,
    phase_two_ran: bool,
}

impl ConversationOrchestrator {
    pub fn builder(
        provider: Arc<dyn ModelProvider>,
        dispatcher: Arc<dyn ToolDispatcher>,
    ) -> ConversationOrchestratorBuilder {
        ConversationOrchestratorBuilder::new(provider, dispatcher)
    }

    pub fn new(provider: Arc<dyn ModelProvider>, dispatcher: Arc<dyn ToolDispatcher>) -> Self {
        Self::builder(provider, dispatcher).build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Caller-facing entrypoint: one cycle folded into the end-user shape.
    pub async fn orchestrate(
        &self,
        message: impl Into<String>,
        history: Vec<HistoryTurn>,
    ) -> OrchestrationResult {
        self.run_turn(ChatTurnRequest::new(message).with_history(history))
            .await
            .into()
    }

    /// Runs one cycle and reports the state path and tool outcomes.
    pub async fn run_turn(&self, request: ChatTurnRequest) -> Result<ChatTurnResult, ChatError> {
        let trace_id = request.trace_id.clone().unwrap_or_else(TraceId::generate);
        let deadline = request
            .deadline
            .or_else(|| self.cycle_timeout.map(Deadline::after));
        let started = Instant::now();

        let mut cycle = Cycle::new(&trace_id, self.hooks.as_ref());
        let outcome = self.run_cycle(&mut cycle, request, deadline).await;
        cycle.enter(OrchestrationState::Done);
        let states = cycle.states;

        match outcome {
            Ok(output) => {
                let result = ChatTurnResult {
                    trace_id: trace_id.clone(),
                    answer: output.answer,
                    tool_results: output.tool_results,
                    skipped_tool_calls: output.skipped_tool_calls,
                    states,
                    phase_two_ran: output.phase_two_ran,
                };
                self.hooks
                    .on_cycle_completed(&trace_id, &result, started.elapsed());
                Ok(result)
            }
            Err(error) => {
                self.hooks
                    .on_cycle_failed(&trace_id, &error, started.elapsed());
                Err(error)
            }
        }
    }

    async fn run_cycle(
        &self,
        cycle: &mut Cycle<'_>,
        request: ChatTurnRequest,
        deadline: Option<Deadline>,
    ) -> Result<CycleOutput, ChatError> {
        cycle.enter(OrchestrationState::Building);
        let mut transcript = self.build_transcript(&request)?;
        let tools = self.dispatcher.definitions();

        cycle.enter(OrchestrationState::AwaitingFirstResponse);
        let first = self
            .stream_phase(
                self.model_request(transcript.clone(), tools),
                deadline,
                ChatErrorPhase::FirstResponse,
                0,
            )
            .await?;

        let calls = first
            .tool_calls
            .iter()
            .filter_map(ToolCallRequest::validate)
            .collect::<Vec<ToolCall>>();
        let skipped_tool_calls = first.tool_calls.len() - calls.len();

        if calls.is_empty() {
            return Ok(CycleOutput {
                answer: first.text,
                tool_results: Vec::new(),
                skipped_tool_calls,
                phase_two_ran: false,
            });
        }

        cycle.enter(OrchestrationState::DispatchingTools);
        transcript.push(Message::assistant_tool_calls(first.text, first.tool_calls));

        let mut tool_results = Vec::with_capacity(calls.len());
        for call in calls {
            if deadline.is_some_and(|deadline| deadline.is_expired()) {
                return Err(ChatError::timeout("cycle deadline expired during tool dispatch")
                    .with_phase(ChatErrorPhase::ToolDispatch)
                    .with_tools_executed(tool_results.len()));
            }

            let mut context = ToolExecutionContext::new().with_trace_id(cycle.trace_id.clone());
            if let Some(deadline) = deadline {
                context = context.with_deadline(deadline);
            }

            let result = self.dispatcher.execute(call, context).await;
            transcript.push(result.clone().into_message());
            tool_results.push(result);
        }

        cycle.enter(OrchestrationState::AwaitingSecondResponse);
        let second = self
            .stream_phase(
                self.model_request(transcript, Vec::new()),
                deadline,
                ChatErrorPhase::SecondResponse,
                tool_results.len(),
            )
            .await?;

        Ok(CycleOutput {
            answer: second.text,
            tool_results,
            skipped_tool_calls,
            phase_two_ran: true,
        })
    }

    /// System prompt, then each present side of every history turn, then the
    /// current message. Blank history sides are dropped.
    fn build_transcript(&self, request: &ChatTurnRequest) -> Result<Vec<Message>, ChatError> {
        if request.message.trim().is_empty() {
            return Err(ChatError::invalid_request("message must not be empty"));
        }

        let mut messages = Vec::with_capacity(request.history.len() * 2 + 2);
        messages.push(Message::system(self.system_prompt.clone()));

        for turn in &request.history {
            if let Some(user) = non_blank(&turn.user) {
                messages.push(Message::user(user));
            }
            if let Some(ai) = non_blank(&turn.ai) {
                messages.push(Message::assistant(ai));
            }
        }

        messages.push(Message::user(request.message.clone()));
        Ok(messages)
    }

    fn model_request(&self, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> ModelRequest {
        ModelRequest::new(self.model.clone(), messages)
            .with_tools(tools)
            .with_options(self.options)
            .enable_streaming()
    }

    /// One streamed call drained into a fresh accumulator. Retries cover
    /// establishing the stream only; the deadline covers everything.
    async fn stream_phase(
        &self,
        request: ModelRequest,
        deadline: Option<Deadline>,
        phase: ChatErrorPhase,
        tools_executed: usize,
    ) -> Result<StreamSnapshot, ChatError> {
        let provider = self.provider.as_ref();
        let call = async {
            let stream = execute_with_retry(
                provider.id(),
                ProviderOperation::Stream,
                &self.retry_policy,
                self.provider_hooks.as_ref(),
                |_| provider.stream(request.clone()),
                Delay::new,
            )
            .await?;

            collect_stream(stream).await
        };

        match within_deadline(call, deadline).await {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(error)) => Err(ChatError::from(error)
                .with_phase(phase)
                .with_tools_executed(tools_executed)),
            None => Err(ChatError::timeout(format!(
                "cycle deadline expired during {}",
                phase.as_str()
            ))
            .with_phase(phase)
            .with_tools_executed(tools_executed)),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}
