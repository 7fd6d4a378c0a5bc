//! Facade over the hakim workspace crates.
//!
//! Re-exports the provider, tooling, chat and observability layers, and adds
//! layered configuration, logging setup, the `amap_weather` tool and runtime
//! wiring on top of them.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hakim::prelude::*;
//! use hakim::tools::{CityCodeLookup, LiveWeather, WeatherSource, WeatherTool};
//!
//! struct Sunny;
//!
//! impl WeatherSource for Sunny {
//!     fn live<'a>(&'a self, _adcode: &'a str) -> ToolFuture<'a, Result<LiveWeather, ToolError>> {
//!         Box::pin(async {
//!             Ok(LiveWeather { weather: "晴".to_string(), temperature: "25".to_string() })
//!         })
//!     }
//! }
//!
//! let config = HakimConfig::from_toml_str("", [("DASHSCOPE_API_KEY", "sk-demo")])
//!     .expect("config loads");
//!
//! let mut registry = ToolRegistry::new();
//! registry
//!     .register(WeatherTool::new(
//!         Arc::new(CityCodeLookup::from_pairs([("海淀区", "110108")])),
//!         Arc::new(Sunny),
//!     ))
//!     .expect("weather tool registers");
//!
//! # #[cfg(feature = "provider-dashscope")]
//! # {
//! let provider = hakim::dashscope_provider(&config).expect("provider builds");
//! let runtime = hakim::build_runtime_with(&config, provider, registry);
//! assert_eq!(runtime.orchestrator.model(), "qwen-max");
//! assert_eq!(runtime.tools.names(), vec!["amap_weather"]);
//! # }
//! ```

mod error;

pub mod config;
pub mod logging;
pub mod prelude;
pub mod runtime;
pub mod tools;

pub use hchat;
pub use hcommon;
pub use hobserve;
pub use hprovider;
pub use htooling;

pub use crate::config::{HakimConfig, LoggingConfig, ModelConfig, OrchestrationConfig, WeatherConfig};
pub use error::{HakimError, HakimErrorKind};
pub use logging::{env_filter, init_logging};
#[cfg(feature = "provider-dashscope")]
pub use runtime::{build_runtime, dashscope_provider};
pub use runtime::{HakimRuntime, build_runtime_with, city_codes, default_registry};

pub use hchat::{
    ChatError, ChatErrorKind, ChatErrorPhase, ChatTurnRequest, ChatTurnResult,
    ConversationOrchestrator, ConversationOrchestratorBuilder, Diagnosis, DiagnosisReport,
    DiagnosisRequest, DiagnosisRequester, ErrorInfo, HistoryTurn, OrchestrationHooks,
    OrchestrationResult, OrchestrationState,
};
pub use hcommon::{BoxFuture, Deadline, GenerationOptions, TraceId};
pub use hobserve::{
    MetricsObservabilityHooks, SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks,
    TracingObservabilityHooks,
};
pub use hprovider::{
    Message, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderErrorKind,
    ProviderId, RetryPolicy, Role, SecretString, SecureCredentialManager, ToolCall,
    ToolCallRequest, ToolDefinition, ToolResult,
};
pub use htooling::{
    DefaultToolDispatcher, Tool, ToolDispatcher, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolFuture, ToolRegistry, required_string,
};
