//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use hprovider::{ProviderError, ProviderErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatErrorKind {
    InvalidRequest,
    Transport,
    Protocol,
    Timeout,
    MalformedPayload,
    Configuration,
}

impl ChatErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Transport => "transport",
            Self::Protocol => "protocol",
            Self::Timeout => "timeout",
            Self::MalformedPayload => "malformed_payload",
            Self::Configuration => "configuration",
        }
    }
}

/// Where in the cycle a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatErrorPhase {
    FirstResponse,
    ToolDispatch,
    SecondResponse,
}

impl ChatErrorPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstResponse => "first_response",
            Self::ToolDispatch => "tool_dispatch",
            Self::SecondResponse => "second_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub phase: Option<ChatErrorPhase>,
    pub tools_executed: usize,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            phase: None,
            tools_executed: 0,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Transport, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Protocol, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Timeout, message)
    }

    pub fn malformed_payload(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::MalformedPayload, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Configuration, message)
    }

    pub fn with_phase(mut self, phase: ChatErrorPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_tools_executed(mut self, tools_executed: usize) -> Self {
        self.tools_executed = tools_executed;
        self
    }

    /// True when tools already ran before the failure, so only the second
    /// model call needs repeating.
    pub fn is_after_tool_dispatch(&self) -> bool {
        self.phase == Some(ChatErrorPhase::SecondResponse)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ChatErrorKind::Timeout
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.phase {
            Some(phase) => write!(f, "{:?} during {}: {}", self.kind, phase.as_str(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ChatError {}

/// Any status reported by the endpoint is a transport failure for that call;
/// the provider's finer classification only applies to local failures.
impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        if value.status.is_some() {
            return ChatError::transport(value.to_string());
        }

        let kind = match value.kind {
            ProviderErrorKind::Timeout => ChatErrorKind::Timeout,
            ProviderErrorKind::Protocol => ChatErrorKind::Protocol,
            ProviderErrorKind::InvalidRequest => ChatErrorKind::InvalidRequest,
            ProviderErrorKind::Authentication => ChatErrorKind::Configuration,
            ProviderErrorKind::RateLimited
            | ProviderErrorKind::Transport
            | ProviderErrorKind::Unavailable
            | ProviderErrorKind::Other => ChatErrorKind::Transport,
        };

        ChatError::new(kind, value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_onto_chat_kinds() {
        let cases = [
            (ProviderError::status(503, None), ChatErrorKind::Transport),
            (ProviderError::status(429, None), ChatErrorKind::Transport),
            (ProviderError::status(400, None), ChatErrorKind::Transport),
            (ProviderError::status(504, None), ChatErrorKind::Transport),
            (ProviderError::transport("reset"), ChatErrorKind::Transport),
            (ProviderError::timeout("slow"), ChatErrorKind::Timeout),
            (ProviderError::protocol("no output"), ChatErrorKind::Protocol),
            (ProviderError::invalid_request("empty"), ChatErrorKind::InvalidRequest),
            (ProviderError::authentication("no key"), ChatErrorKind::Configuration),
        ];

        for (error, expected) in cases {
            assert_eq!(ChatError::from(error).kind, expected);
        }
    }

    #[test]
    fn only_second_phase_failures_count_as_after_dispatch() {
        let first = ChatError::transport("down").with_phase(ChatErrorPhase::FirstResponse);
        let second = ChatError::transport("down")
            .with_phase(ChatErrorPhase::SecondResponse)
            .with_tools_executed(1);

        assert!(!first.is_after_tool_dispatch());
        assert!(second.is_after_tool_dispatch());
        assert_eq!(second.tools_executed, 1);
        assert_eq!(second.to_string(), "Transport during second_response: down");
    }
}
