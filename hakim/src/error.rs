//! Startup errors raised while loading configuration and wiring the runtime.

use std::fmt::{Display, Formatter};

use hprovider::ProviderError;
use htooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HakimErrorKind {
    Configuration,
    Credentials,
    Tooling,
    Logging,
    Io,
}

impl HakimErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Credentials => "credentials",
            Self::Tooling => "tooling",
            Self::Logging => "logging",
            Self::Io => "io",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HakimError {
    pub kind: HakimErrorKind,
    pub message: String,
}

impl HakimError {
    pub fn new(kind: HakimErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(HakimErrorKind::Configuration, message)
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(HakimErrorKind::Credentials, message)
    }

    pub fn tooling(message: impl Into<String>) -> Self {
        Self::new(HakimErrorKind::Tooling, message)
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::new(HakimErrorKind::Logging, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(HakimErrorKind::Io, message)
    }
}

impl Display for HakimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for HakimError {}

impl From<config::ConfigError> for HakimError {
    fn from(value: config::ConfigError) -> Self {
        Self::configuration(value.to_string())
    }
}

impl From<ProviderError> for HakimError {
    fn from(value: ProviderError) -> Self {
        Self::credentials(value.to_string())
    }
}

impl From<ToolError> for HakimError {
    fn from(value: ToolError) -> Self {
        Self::tooling(value.to_string())
    }
}

impl From<std::io::Error> for HakimError {
    fn from(value: std::io::Error) -> Self {
        Self::io(value.to_string())
    }
}
