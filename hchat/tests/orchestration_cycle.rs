mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hchat::prelude::*;
use hchat::ErrorInfo;
use hprovider::{
    Message, ModelResponse, ProviderError, RetryPolicy, Role, ToolCallRequest,
};
use htooling::DefaultToolDispatcher;
use serde_json::{Value, json};

use support::{Script, ScriptedProvider, calls, text, weather_call, weather_registry};

fn orchestrator(
    provider: Arc<ScriptedProvider>,
    invocations: Arc<AtomicUsize>,
) -> ConversationOrchestratorBuilder {
    let dispatcher = DefaultToolDispatcher::new(Arc::new(weather_registry(invocations)));
    ConversationOrchestrator::builder(provider, Arc::new(dispatcher))
        .retry_policy(RetryPolicy::none())
}

fn content_json(message: &Message) -> Value {
    serde_json::from_str(message.text()).expect("tool content is JSON")
}

#[tokio::test]
async fn weather_question_runs_tool_then_narrates_result() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![
            text(""),
            calls(vec![weather_call("call_1", "{\"location\":")]),
            calls(vec![weather_call("call_1", "{\"location\":\"District X\"}")]),
            Ok(ModelResponse::new(200, None)),
        ]),
        Script::Increments(vec![
            text("District X is"),
            text("District X is sunny at 25°C."),
        ]),
    ]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let result = orchestrator(provider.clone(), invocations.clone())
        .build()
        .run_turn(ChatTurnRequest::new("What's the weather in District X?"))
        .await
        .expect("cycle should succeed");

    assert_eq!(result.answer, "District X is sunny at 25°C.");
    assert!(result.phase_two_ran);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(
        result.states,
        vec![
            OrchestrationState::Building,
            OrchestrationState::AwaitingFirstResponse,
            OrchestrationState::DispatchingTools,
            OrchestrationState::AwaitingSecondResponse,
            OrchestrationState::Done,
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);

    let first = &requests[0];
    assert!(first.options.stream);
    assert_eq!(first.options.seed, Some(1234));
    assert_eq!(first.tools.len(), 1);
    assert_eq!(first.tools[0].name, "weather");

    let second = &requests[1];
    assert!(second.tools.is_empty());
    assert_eq!(second.messages.len(), first.messages.len() + 2);
    assert_eq!(second.messages[..first.messages.len()], first.messages[..]);

    let assistant = &second.messages[first.messages.len()];
    assert_eq!(assistant.role, Role::Assistant);
    assert_eq!(assistant.text(), "");
    assert_eq!(
        assistant.tool_calls,
        vec![weather_call("call_1", "{\"location\":\"District X\"}")]
    );

    let tool = &second.messages[first.messages.len() + 1];
    assert_eq!(tool.role, Role::Tool);
    assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(
        content_json(tool),
        json!({"weather": "sunny", "temperature": "25", "location": "District X"})
    );
}

#[tokio::test]
async fn no_tool_calls_means_single_call_and_verbatim_answer() {
    for answer in ["请多休息，多喝水。", ""] {
        let provider = ScriptedProvider::new(vec![Script::Increments(vec![
            text("请多"),
            text(answer),
        ])]);

        let result = orchestrator(provider.clone(), Arc::new(AtomicUsize::new(0)))
            .build()
            .run_turn(ChatTurnRequest::new("感冒了怎么办"))
            .await
            .expect("cycle should succeed");

        assert_eq!(result.answer, answer);
        assert!(!result.phase_two_ran);
        assert_eq!(provider.requests().len(), 1);
        assert_eq!(
            result.states,
            vec![
                OrchestrationState::Building,
                OrchestrationState::AwaitingFirstResponse,
                OrchestrationState::Done,
            ]
        );
    }
}

#[tokio::test]
async fn first_phase_failure_aborts_without_dispatching() {
    let provider = ScriptedProvider::new(vec![Script::Increments(vec![
        calls(vec![weather_call("call_1", "{\"location\":\"District X\"}")]),
        Ok(ModelResponse::failed(500, Some("InternalError"), Some("boom"))),
    ])]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let result = orchestrator(provider.clone(), invocations.clone())
        .build()
        .orchestrate("What's the weather in District X?", Vec::new())
        .await;

    assert!(!result.success);
    assert!(result.answer.is_empty());
    let error = result.error.expect("error info");
    assert_eq!(error.kind, ChatErrorKind::Transport);
    assert_eq!(error.phase, Some(ChatErrorPhase::FirstResponse));
    assert_eq!(error.tools_executed, 0);
    assert!(error.message.starts_with("AI assistant service error: "));
    assert!(error.message.contains("InternalError: boom"));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn malformed_arguments_become_error_result_and_cycle_continues() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![calls(vec![
            weather_call("call_1", "{bad json"),
            weather_call("call_2", "{\"location\":\"District X\"}"),
        ])]),
        Script::Increments(vec![text("One lookup failed, District X is sunny.")]),
    ]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let result = orchestrator(provider.clone(), invocations.clone())
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect("tool failures never abort the cycle");

    assert_eq!(result.answer, "One lookup failed, District X is sunny.");
    assert_eq!(result.tool_results.len(), 2);
    assert!(result.tool_results[0].is_error);
    assert!(!result.tool_results[1].is_error);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);

    let second = &provider.requests()[1];
    let tool_messages = second
        .messages
        .iter()
        .filter(|message| message.role == Role::Tool)
        .collect::<Vec<_>>();
    assert_eq!(tool_messages.len(), 2);
    assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(content_json(tool_messages[0])["error"], "invalid arguments");
    assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("call_2"));
}

#[tokio::test]
async fn failing_and_unknown_tools_do_not_block_later_calls() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![calls(vec![
            ToolCallRequest::new("call_1", "horoscope", "{}"),
            weather_call("call_2", "{\"location\":\"Atlantis\"}"),
            weather_call("call_3", "{\"location\":\"District X\"}"),
        ])]),
        Script::Increments(vec![text("done")]),
    ]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let result = orchestrator(provider, invocations.clone())
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect("cycle should succeed");

    let ids = result
        .tool_results
        .iter()
        .map(|result| (result.tool_call_id.as_str(), result.is_error))
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![("call_1", true), ("call_2", true), ("call_3", false)]);
    assert_eq!(
        result.tool_results[0].content,
        json!({"error": "unknown tool: horoscope"}).to_string()
    );
    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn malformed_tool_calls_are_skipped_but_echoed() {
    let nameless = ToolCallRequest {
        id: Some("call_0".to_string()),
        tool_name: None,
        raw_arguments: Some("{}".to_string()),
    };
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![calls(vec![
            nameless.clone(),
            weather_call("call_1", "{\"location\":\"District X\"}"),
        ])]),
        Script::Increments(vec![text("sunny")]),
    ]);

    let result = orchestrator(provider.clone(), Arc::new(AtomicUsize::new(0)))
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect("cycle should succeed");

    assert_eq!(result.skipped_tool_calls, 1);
    assert_eq!(result.tool_results.len(), 1);

    let second = &provider.requests()[1];
    let assistant = second
        .messages
        .iter()
        .find(|message| message.has_tool_calls())
        .expect("assistant tool-call message");
    assert_eq!(assistant.tool_calls.len(), 2);
    assert_eq!(assistant.tool_calls[0], nameless);
}

#[tokio::test]
async fn all_malformed_tool_calls_fall_back_to_first_text() {
    let idless = ToolCallRequest {
        id: None,
        tool_name: Some("weather".to_string()),
        raw_arguments: None,
    };
    let provider = ScriptedProvider::new(vec![Script::Increments(vec![Ok(
        ModelResponse::from_message(
            hprovider::ResponseMessage::tool_calls(vec![idless]).with_content("稍等"),
        ),
    )])]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let result = orchestrator(provider.clone(), invocations.clone())
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect("cycle should succeed");

    assert_eq!(result.answer, "稍等");
    assert_eq!(result.skipped_tool_calls, 1);
    assert!(!result.phase_two_ran);
    assert_eq!(provider.requests().len(), 1);
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_phase_failure_is_distinguishable() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![calls(vec![weather_call(
            "call_1",
            "{\"location\":\"District X\"}",
        )])]),
        Script::Fail(ProviderError::status(503, Some("ServiceUnavailable"))),
    ]);
    let invocations = Arc::new(AtomicUsize::new(0));

    let error = orchestrator(provider, invocations.clone())
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect_err("second call fails");

    assert_eq!(error.kind, ChatErrorKind::Transport);
    assert_eq!(error.phase, Some(ChatErrorPhase::SecondResponse));
    assert!(error.is_after_tool_dispatch());
    assert_eq!(error.tools_executed, 1);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);

    let info = ErrorInfo::from(&error);
    assert_eq!(info.tools_executed, 1);
}

#[tokio::test]
async fn second_phase_without_increments_answers_empty() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![
            text("让我查一下"),
            calls(vec![weather_call("call_1", "{\"location\":\"District X\"}")]),
        ]),
        Script::Increments(Vec::new()),
    ]);

    let result = orchestrator(provider, Arc::new(AtomicUsize::new(0)))
        .build()
        .orchestrate("weather?", Vec::new())
        .await;

    assert!(result.success);
    assert_eq!(result.answer, "");
}

#[tokio::test]
async fn stalled_stream_times_out() {
    let provider = ScriptedProvider::new(vec![Script::Stall]);

    let error = orchestrator(provider, Arc::new(AtomicUsize::new(0)))
        .build()
        .run_turn(
            ChatTurnRequest::new("hello").with_deadline(Deadline::after(Duration::from_millis(30))),
        )
        .await
        .expect_err("stall must not hang");

    assert_eq!(error.kind, ChatErrorKind::Timeout);
    assert_eq!(error.phase, Some(ChatErrorPhase::FirstResponse));
}

#[tokio::test]
async fn builder_cycle_timeout_bounds_second_phase() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![calls(vec![weather_call(
            "call_1",
            "{\"location\":\"District X\"}",
        )])]),
        Script::Stall,
    ]);

    let error = orchestrator(provider, Arc::new(AtomicUsize::new(0)))
        .cycle_timeout(Some(Duration::from_millis(30)))
        .build()
        .run_turn(ChatTurnRequest::new("weather?"))
        .await
        .expect_err("stall must not hang");

    assert!(error.is_timeout());
    assert_eq!(error.phase, Some(ChatErrorPhase::SecondResponse));
    assert_eq!(error.tools_executed, 1);
}

#[tokio::test]
async fn retryable_connection_failure_is_retried() {
    let provider = ScriptedProvider::new(vec![
        Script::Fail(ProviderError::unavailable("connection refused")),
        Script::Increments(vec![text("好的")]),
    ]);

    let result = orchestrator(provider.clone(), Arc::new(AtomicUsize::new(0)))
        .retry_policy(RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            backoff_multiplier: 1.0,
            throttle_backoff: Duration::from_millis(1),
        })
        .build()
        .run_turn(ChatTurnRequest::new("hi"))
        .await
        .expect("second attempt succeeds");

    assert_eq!(result.answer, "好的");
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn history_is_replayed_in_order_after_system_prompt() {
    let provider = ScriptedProvider::new(vec![Script::Increments(vec![text("ok")])]);

    orchestrator(provider.clone(), Arc::new(AtomicUsize::new(0)))
        .system_prompt("persona")
        .build()
        .orchestrate(
            "第三个问题",
            vec![
                HistoryTurn::new("第一个问题", "第一个回答"),
                HistoryTurn::user_only("第二个问题"),
                HistoryTurn {
                    user: Some("  ".to_string()),
                    ai: Some("第二个回答".to_string()),
                },
            ],
        )
        .await;

    let messages = &provider.requests()[0].messages;
    let shape = messages
        .iter()
        .map(|message| (message.role, message.text()))
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        vec![
            (Role::System, "persona"),
            (Role::User, "第一个问题"),
            (Role::Assistant, "第一个回答"),
            (Role::User, "第二个问题"),
            (Role::Assistant, "第二个回答"),
            (Role::User, "第三个问题"),
        ]
    );
}

#[tokio::test]
async fn blank_message_is_rejected_before_any_call() {
    let provider = ScriptedProvider::new(Vec::new());

    let result = orchestrator(provider.clone(), Arc::new(AtomicUsize::new(0)))
        .build()
        .orchestrate("   ", Vec::new())
        .await;

    assert_eq!(result.error_kind(), Some(ChatErrorKind::InvalidRequest));
    assert!(provider.requests().is_empty());
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl OrchestrationHooks for RecordingHooks {
    fn on_state_entered(&self, trace_id: &TraceId, state: OrchestrationState) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{trace_id}:{}", state.as_str()));
    }

    fn on_cycle_completed(&self, trace_id: &TraceId, result: &ChatTurnResult, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{trace_id}:completed:{}", result.answer));
    }

    fn on_cycle_failed(&self, trace_id: &TraceId, error: &ChatError, _elapsed: Duration) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{trace_id}:failed:{:?}", error.kind));
    }
}

#[tokio::test]
async fn hooks_observe_state_path_under_caller_trace_id() {
    let provider = ScriptedProvider::new(vec![
        Script::Increments(vec![text("hi")]),
        Script::Fail(ProviderError::transport("reset")),
    ]);
    let hooks = Arc::new(RecordingHooks::default());
    let orchestrator = orchestrator(provider, Arc::new(AtomicUsize::new(0)))
        .hooks(hooks.clone())
        .build();

    orchestrator
        .run_turn(ChatTurnRequest::new("a").with_trace_id("t-1"))
        .await
        .expect("first cycle succeeds");
    orchestrator
        .run_turn(ChatTurnRequest::new("b").with_trace_id("t-2"))
        .await
        .expect_err("second cycle fails");

    let events = hooks.events.lock().expect("events lock").clone();
    assert_eq!(
        events,
        vec![
            "t-1:building",
            "t-1:awaiting_first_response",
            "t-1:done",
            "t-1:completed:hi",
            "t-2:building",
            "t-2:awaiting_first_response",
            "t-2:done",
            "t-2:failed:Transport",
        ]
    );
}
