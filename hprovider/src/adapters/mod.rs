//! Built-in provider adapters.

#[cfg(feature = "provider-dashscope")]
pub mod dashscope;
