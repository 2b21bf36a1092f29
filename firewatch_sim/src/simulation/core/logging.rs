// firewatch_sim/src/simulation/core/logging.rs

//! Process-wide tracing set-up. Called once by the binary.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::simulation::config::structs::LoggingConfig;
use crate::simulation::core::error::{SimError, SimResult};

/// Builds the level filter. `RUST_LOG` wins over the configured level.
pub fn filter(config: &LoggingConfig) -> SimResult<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| SimError::Logging(format!("bad level '{}': {e}", config.level)))
}

/// Installs the global subscriber, plain text or JSON.
pub fn init(config: &LoggingConfig) -> SimResult<()> {
    let filter = filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };
    result.map_err(|e| SimError::Logging(e.to_string()))
}
