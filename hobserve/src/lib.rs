//! Observability for provider calls, tool dispatch and orchestration cycles.
//!
//! The core crates only expose hook traits; this crate implements them with
//! `tracing` events and `metrics` counters and histograms. Wrap any hook in
//! a `Safe*Hooks` adapter to keep a panicking hook from unwinding into a
//! cycle.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use hchat::OrchestrationHooks;
//! use hobserve::{MetricsObservabilityHooks, SafeOrchestrationHooks, TracingObservabilityHooks};
//!
//! let hooks: Arc<dyn OrchestrationHooks> =
//!     Arc::new(SafeOrchestrationHooks::new(TracingObservabilityHooks));
//! let _metrics = MetricsObservabilityHooks;
//! # let _ = hooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeOrchestrationHooks, SafeProviderHooks, SafeToolHooks,
        TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
