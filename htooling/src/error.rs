//! Tool errors and their rendering into tool-result payloads.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No tool is registered under the requested name.
    UnknownTool,
    /// A registered tool could not find what it was asked about.
    NotFound,
    InvalidArguments,
    AlreadyRegistered,
    Execution,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub tool_name: Option<String>,
    pub tool_call_id: Option<String>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn unknown_tool(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::UnknownTool,
            format!("tool '{tool_name}' is not registered"),
            false,
        )
        .with_tool_name(tool_name)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message, false)
    }

    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidArguments, message, false)
    }

    pub fn already_registered(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        Self::new(
            ToolErrorKind::AlreadyRegistered,
            format!("tool '{tool_name}' is already registered"),
            false,
        )
        .with_tool_name(tool_name)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message, false)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message, true)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_tool_call_id(mut self, tool_call_id: impl Into<String>) -> Self {
        self.tool_call_id = Some(tool_call_id.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// JSON object handed back to the model in place of a tool output.
    ///
    /// Failed registry lookups render as `{"error": "unknown tool: <name>"}`,
    /// argument failures as `{"error": "invalid arguments", "detail": ...}`,
    /// anything else, handler-raised `NotFound` included, as
    /// `{"error": <message>}`.
    pub fn to_payload(&self) -> Value {
        match self.kind {
            ToolErrorKind::UnknownTool => json!({
                "error": format!("unknown tool: {}", self.tool_name.as_deref().unwrap_or_default())
            }),
            ToolErrorKind::InvalidArguments => json!({
                "error": "invalid arguments",
                "detail": self.message,
            }),
            _ => json!({ "error": self.message }),
        }
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.tool_name, &self.tool_call_id) {
            (Some(tool_name), Some(tool_call_id)) => write!(
                f,
                "{:?} [tool={}, call_id={}]: {}",
                self.kind, tool_name, tool_call_id, self.message
            ),
            (Some(tool_name), None) => {
                write!(f, "{:?} [tool={}]: {}", self.kind, tool_name, self.message)
            }
            _ => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shapes_match_failure_kind() {
        let unknown = ToolError::unknown_tool("geocode");
        assert_eq!(unknown.to_payload(), json!({"error": "unknown tool: geocode"}));

        let missing = ToolError::not_found("record 42 does not exist").with_tool_name("lookup");
        assert_eq!(missing.to_payload(), json!({"error": "record 42 does not exist"}));

        let invalid = ToolError::invalid_arguments("expected JSON object arguments");
        assert_eq!(invalid.to_payload()["error"], "invalid arguments");

        let failed = ToolError::execution("城市编码未找到");
        assert_eq!(failed.to_payload(), json!({"error": "城市编码未找到"}));
    }

    #[test]
    fn context_fields_are_included_in_display() {
        let error = ToolError::timeout("slow")
            .with_tool_name("amap_weather")
            .with_tool_call_id("call_1");

        let rendered = error.to_string();
        assert!(rendered.contains("amap_weather"));
        assert!(rendered.contains("call_1"));
        assert!(error.is_retryable());
    }
}
