//! Provider layer: conversation model, tool definition export, response
//! envelopes, stream accumulation and the DashScope adapter.
//!
//! ```rust
//! use hprovider::prelude::*;
//!
//! let request = ModelRequest::builder("qwen-max")
//!     .message(Message::system("You are a helpful medical assistant."))
//!     .message(Message::user("我头痛"))
//!     .tools(vec![ToolDefinition::new("amap_weather", "Live weather")
//!         .with_parameter("location", "string", "District name", true)])
//!     .enable_streaming()
//!     .build()
//!     .expect("request should validate");
//!
//! assert!(request.options.stream);
//! assert_eq!(request.tools.len(), 1);
//! ```

mod accumulator;
mod credentials;
mod definition;
mod error;
mod model;
mod provider;
mod resilience;
mod response;
mod stream;

pub mod adapters;
pub mod prelude;

pub use accumulator::{StreamAccumulator, StreamSnapshot};
pub use credentials::{SecretString, SecureCredentialManager};
pub use definition::{ParameterSpec, ToolDefinition};
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    Message, ModelRequest, ModelRequestBuilder, Role, ToolCall, ToolCallRequest, ToolResult,
};
pub use provider::{ModelProvider, ProviderFuture, ProviderId};
pub use resilience::{
    NoopOperationHooks, ProviderOperation, ProviderOperationHooks, RetryPolicy, execute_with_retry,
};
pub use response::{ModelResponse, ResponseChoice, ResponseMessage, ResponseOutput};
pub use stream::{BoxedResponseStream, ResponseStream, VecResponseStream, collect_stream};

pub use hcommon::GenerationOptions;
