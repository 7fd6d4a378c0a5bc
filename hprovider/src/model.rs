//! Provider-agnostic conversation and request model types.
//!
//! ```rust
//! use hprovider::{Message, ModelRequest, ProviderErrorKind, ToolCallRequest};
//!
//! let call = ToolCallRequest::new("call_1", "amap_weather", r#"{"location":"海淀区"}"#);
//! let ok = ModelRequest::builder("qwen-max")
//!     .message(Message::user("What's the weather in 海淀区?"))
//!     .message(Message::assistant_tool_calls("", vec![call]))
//!     .message(Message::tool("call_1", r#"{"weather":"晴"}"#))
//!     .build();
//! assert!(ok.is_ok());
//!
//! let orphan = ModelRequest::builder("qwen-max")
//!     .message(Message::tool("call_9", "{}"))
//!     .build()
//!     .err()
//!     .expect("tool message without a matching call should fail");
//! assert_eq!(orphan.kind, ProviderErrorKind::InvalidRequest);
//! ```

use std::collections::HashSet;

use hcommon::GenerationOptions;

use crate::{ProviderError, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One transcript entry.
///
/// `content` is absent when the model produced none; an assistant message
/// that carries `tool_calls` may have empty or absent content. A `tool`
/// message always carries the `tool_call_id` it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A tool call exactly as the model emitted it.
///
/// Every field is optional because upstream increments may omit any of
/// them; [`ToolCallRequest::validate`] decides whether the call can be
/// dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCallRequest {
    pub id: Option<String>,
    pub tool_name: Option<String>,
    pub raw_arguments: Option<String>,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        raw_arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            tool_name: Some(tool_name.into()),
            raw_arguments: Some(raw_arguments.into()),
        }
    }

    /// Returns a dispatchable call when both `id` and `tool_name` are
    /// present and non-blank. The id is kept verbatim so the tool message
    /// echoes it exactly. Missing arguments become `"{}"`.
    pub fn validate(&self) -> Option<ToolCall> {
        let id = self.id.as_deref().filter(|id| !id.trim().is_empty())?;
        let name = self
            .tool_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())?;

        Some(ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: self
                .raw_arguments
                .clone()
                .unwrap_or_else(|| "{}".to_string()),
        })
    }
}

/// A validated tool call ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// Normalized outcome of one tool invocation. `content` is always JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }

    pub fn into_message(self) -> Message {
        Message::tool(self.tool_call_id, self.content)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerationOptions,
}

impl ModelRequest {
    pub fn builder(model: impl Into<String>) -> ModelRequestBuilder {
        ModelRequestBuilder::new(model)
    }

    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn enable_streaming(mut self) -> Self {
        self.options.stream = true;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        let mut announced = HashSet::new();
        for message in &self.messages {
            match message.role {
                Role::Assistant => {
                    announced.extend(message.tool_calls.iter().filter_map(|call| call.id.as_deref()));
                }
                Role::Tool => {
                    let Some(tool_call_id) = message.tool_call_id.as_deref() else {
                        return Err(ProviderError::invalid_request(
                            "tool message must carry a tool_call_id",
                        ));
                    };

                    if !announced.contains(tool_call_id) {
                        return Err(ProviderError::invalid_request(format!(
                            "tool message references unknown tool call '{tool_call_id}'"
                        )));
                    }
                }
                Role::System | Role::User => {}
            }
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequestBuilder {
    model: String,
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    options: GenerationOptions,
}

impl ModelRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            tools: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn streaming(mut self, stream: bool) -> Self {
        self.options.stream = stream;
        self
    }

    pub fn enable_streaming(self) -> Self {
        self.streaming(true)
    }

    pub fn build(self) -> Result<ModelRequest, ProviderError> {
        let request = ModelRequest {
            model: self.model,
            messages: self.messages,
            tools: self.tools,
            options: self.options,
        };

        request.validate()?;
        Ok(request)
    }
}
