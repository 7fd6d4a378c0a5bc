//! DashScope request and auth types.

use std::fmt::Formatter;

use hcommon::GenerationOptions;

use crate::{Message, SecretString, ToolDefinition};

/// A validated request addressed to the generation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DashScopeRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub options: GenerationOptions,
}

impl DashScopeRequest {
    pub fn is_streaming(&self) -> bool {
        self.options.stream
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum DashScopeAuth {
    ApiKey(SecretString),
}

impl DashScopeAuth {
    pub(crate) fn bearer(&self) -> &str {
        match self {
            Self::ApiKey(key) => key.expose(),
        }
    }
}

impl std::fmt::Debug for DashScopeAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("DashScopeAuth::ApiKey([REDACTED])"),
        }
    }
}
