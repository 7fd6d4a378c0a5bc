//! DashScope text-generation adapter (message result format, SSE streaming).

mod auth;
mod provider;
mod serde_api;
mod sse;
mod transport;
mod types;

pub use provider::DashScopeProvider;
pub use sse::{SseDecoder, SseFrame};
pub use transport::{DASHSCOPE_GENERATION_URL, DashScopeHttpTransport, DashScopeTransport};
pub use types::{DashScopeAuth, DashScopeRequest};
