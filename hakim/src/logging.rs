//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::HakimError;

/// Builds the filter, preferring `RUST_LOG` over the configured directive.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, HakimError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive).map_err(|err| {
            HakimError::logging(format!("invalid log filter '{default_directive}': {err}"))
        }),
    }
}

/// Installs a formatting subscriber. Fails if one is already installed.
pub fn init_logging(default_directive: &str) -> Result<(), HakimError> {
    tracing_subscriber::registry()
        .with(env_filter(default_directive)?)
        .with(fmt::layer())
        .try_init()
        .map_err(|err| HakimError::logging(err.to_string()))
}
