#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::stream;
use hprovider::{
    BoxedResponseStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, ResponseMessage, ToolCallRequest, ToolDefinition, VecResponseStream,
};
use htooling::{ToolError, ToolRegistry, required_string};
use serde_json::json;

/// What the next provider call answers with.
pub enum Script {
    Increments(Vec<Result<ModelResponse, ProviderError>>),
    Fail(ProviderError),
    Stall,
    Complete(Result<ModelResponse, ProviderError>),
}

#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn next(&self, request: ModelRequest) -> Option<Script> {
        self.requests.lock().expect("requests lock").push(request);
        self.scripts.lock().expect("scripts lock").pop_front()
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DashScope
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        let script = self.next(request);
        Box::pin(async move {
            match script {
                Some(Script::Complete(outcome)) => outcome,
                Some(Script::Fail(error)) => Err(error),
                Some(Script::Stall) => std::future::pending().await,
                _ => Err(ProviderError::other("no scripted completion")),
            }
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedResponseStream<'a>, ProviderError>> {
        let script = self.next(request);
        Box::pin(async move {
            match script {
                Some(Script::Increments(increments)) => {
                    Ok(Box::pin(VecResponseStream::new(increments)) as BoxedResponseStream<'a>)
                }
                Some(Script::Fail(error)) => Err(error),
                Some(Script::Stall) => Ok(Box::pin(stream::pending::<
                    Result<ModelResponse, ProviderError>,
                >()) as BoxedResponseStream<'a>),
                Some(Script::Complete(_)) | None => {
                    Ok(Box::pin(VecResponseStream::new(Vec::new())) as BoxedResponseStream<'a>)
                }
            }
        })
    }
}

pub fn text(content: &str) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse::from_message(ResponseMessage::text(content)))
}

pub fn calls(calls: Vec<ToolCallRequest>) -> Result<ModelResponse, ProviderError> {
    Ok(ModelResponse::from_message(ResponseMessage::tool_calls(calls)))
}

pub fn weather_call(id: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest::new(id, "weather", arguments)
}

/// Registry with a `weather` tool that counts its invocations.
pub fn weather_registry(invocations: Arc<AtomicUsize>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register_sync_fn(
            ToolDefinition::new("weather", "Live weather for a district").with_parameter(
                "location",
                "string",
                "District name",
                true,
            ),
            move |args, _ctx| {
                invocations.fetch_add(1, Ordering::SeqCst);
                let location = required_string(&args, "location")?;
                if location == "Atlantis" {
                    return Err(ToolError::execution("Amap API Error: INVALID_PARAMS"));
                }
                Ok(json!({"weather": "sunny", "temperature": "25", "location": location}))
            },
        )
        .expect("register weather");
    registry
}
