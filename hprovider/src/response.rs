//! Response envelopes returned by model calls.
//!
//! A streamed call yields a sequence of envelopes (increments); a
//! non-streamed call yields exactly one. Every upstream field is modelled as
//! present-or-absent so that partial increments decode without error.
//!
//! ```rust
//! use hprovider::{ModelResponse, ResponseMessage};
//!
//! let text = ModelResponse::from_message(ResponseMessage::text("您好"));
//! assert!(text.is_success());
//! assert_eq!(text.first_content(), Some("您好"));
//!
//! let failed = ModelResponse::failed(500, Some("InternalError"), Some("boom"));
//! assert!(!failed.is_success());
//! assert_eq!(failed.status_error().status, Some(500));
//! ```

use crate::{ProviderError, ToolCallRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelResponse {
    pub status: u16,
    pub output: Option<ResponseOutput>,
    pub request_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseOutput {
    pub choices: Option<Vec<ResponseChoice>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseChoice {
    pub message: Option<ResponseMessage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl ResponseMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: None,
            tool_calls: Some(tool_calls),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

impl ModelResponse {
    pub fn new(status: u16, output: Option<ResponseOutput>) -> Self {
        Self {
            status,
            output,
            request_id: None,
            error_code: None,
            error_message: None,
        }
    }

    /// A 200 envelope with one choice carrying `message`.
    pub fn from_message(message: ResponseMessage) -> Self {
        Self::new(
            200,
            Some(ResponseOutput {
                choices: Some(vec![ResponseChoice {
                    message: Some(message),
                    finish_reason: None,
                }]),
            }),
        )
    }

    pub fn failed(status: u16, code: Option<&str>, message: Option<&str>) -> Self {
        Self {
            error_code: code.map(ToString::to_string),
            error_message: message.map(ToString::to_string),
            ..Self::new(status, None)
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error describing a non-success envelope.
    pub fn status_error(&self) -> ProviderError {
        ProviderError::upstream(
            self.status,
            self.error_code.as_deref(),
            self.error_message.as_deref(),
        )
    }

    pub fn choices(&self) -> &[ResponseChoice] {
        self.output
            .as_ref()
            .and_then(|output| output.choices.as_deref())
            .unwrap_or_default()
    }

    /// Content of the first choice's message, when present.
    pub fn first_content(&self) -> Option<&str> {
        self.choices()
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}
