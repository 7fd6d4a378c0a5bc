//! DashScope HTTP payload serde models and lenient envelope decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Message, ModelResponse, ProviderError, ResponseChoice, ResponseMessage, ResponseOutput,
    ToolCallRequest,
};

use super::types::DashScopeRequest;

pub(crate) fn build_api_request(request: DashScopeRequest) -> ApiRequest {
    let messages = request
        .messages
        .into_iter()
        .map(ApiMessage::from)
        .collect::<Vec<_>>();

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(request.tools.iter().map(|tool| tool.to_wire()).collect())
    };

    ApiRequest {
        model: request.model,
        input: ApiInput { messages },
        parameters: ApiParameters {
            result_format: "message",
            seed: request.options.seed,
            tools,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            incremental_output: false,
        },
    }
}

/// Decodes one envelope. `status` is the HTTP or SSE frame status the
/// envelope arrived with; a `status_code` inside the body takes precedence.
pub(crate) fn parse_envelope(status: u16, payload: &str) -> Result<ModelResponse, ProviderError> {
    let envelope = serde_json::from_str::<ApiEnvelope>(payload).map_err(|err| {
        ProviderError::transport(format!("malformed DashScope envelope: {err}"))
    })?;

    Ok(envelope.into_model_response(status))
}

/// Error for a non-success HTTP response. Bodies that are not DashScope
/// JSON are classified by status alone.
pub(crate) fn error_from_body(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ApiEnvelope>(body) {
        Ok(parsed) => {
            ProviderError::upstream(status, parsed.code.as_deref(), parsed.message.as_deref())
        }
        Err(_) => ProviderError::status(status, None),
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiRequest {
    pub model: String,
    pub input: ApiInput,
    pub parameters: ApiParameters,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiInput {
    pub messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiParameters {
    pub result_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub incremental_output: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl From<Message> for ApiMessage {
    fn from(value: Message) -> Self {
        Self {
            role: value.role.as_str(),
            content: value.content.unwrap_or_default(),
            tool_calls: value.tool_calls.into_iter().map(ApiToolCall::from).collect(),
            tool_call_id: value.tool_call_id,
        }
    }
}

/// Outbound echo of a tool call. Absent fields stay absent so the transcript
/// replays exactly what the model produced.
#[derive(Debug, Serialize)]
pub(crate) struct ApiToolCall {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub r#type: &'static str,
    pub function: ApiToolFunction,
}

#[derive(Debug, Serialize)]
pub(crate) struct ApiToolFunction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

impl From<ToolCallRequest> for ApiToolCall {
    fn from(value: ToolCallRequest) -> Self {
        Self {
            id: value.id,
            r#type: "function",
            function: ApiToolFunction {
                name: value.tool_name,
                arguments: value.raw_arguments,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiEnvelope {
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output: Option<ApiOutput>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiOutput {
    #[serde(default)]
    pub choices: Option<Vec<ApiChoice>>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiChoice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub message: Option<ApiResponseMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiResponseMessage {
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,
}

impl ApiEnvelope {
    fn into_model_response(self, status: u16) -> ModelResponse {
        let output = self.output.map(|output| {
            let choices = match output.choices {
                Some(choices) => Some(choices.into_iter().map(ApiChoice::into_choice).collect()),
                // `result_format=text` answers carry a bare `output.text`.
                None => output.text.map(|text| {
                    vec![ResponseChoice {
                        message: Some(ResponseMessage::text(text)),
                        finish_reason: None,
                    }]
                }),
            };

            ResponseOutput { choices }
        });

        ModelResponse {
            status: self.status_code.unwrap_or(status),
            output,
            request_id: self.request_id,
            error_code: self.code.filter(|code| !code.is_empty()),
            error_message: self.message.filter(|message| !message.is_empty()),
        }
    }
}

impl ApiChoice {
    fn into_choice(self) -> ResponseChoice {
        ResponseChoice {
            message: self.message.map(|message| ResponseMessage {
                content: message.content.as_ref().and_then(content_text),
                tool_calls: message
                    .tool_calls
                    .map(|calls| calls.iter().map(lenient_tool_call).collect()),
            }),
            finish_reason: self.finish_reason,
        }
    }
}

/// `null` is absent; a string is used as is; a multimodal part list is
/// flattened to its `text` parts.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>(),
        ),
        other => Some(other.to_string()),
    }
}

pub(crate) fn lenient_tool_call(value: &Value) -> ToolCallRequest {
    let function = value.get("function");
    let raw_arguments = function
        .and_then(|function| function.get("arguments"))
        .and_then(|arguments| match arguments {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        });

    ToolCallRequest {
        id: value.get("id").and_then(Value::as_str).map(ToString::to_string),
        tool_name: function
            .and_then(|function| function.get("name"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
        raw_arguments,
    }
}
