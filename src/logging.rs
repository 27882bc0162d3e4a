//! Logging setup
//!
//! The library only emits `tracing` events; binaries install a subscriber
//! here. Output goes to stderr so it never mixes with prompts on stdout.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{FlowError, FlowResult};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init(default_filter: &str) -> FlowResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| FlowError::Config(format!("Invalid log filter '{}': {}", default_filter, e)))?,
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| FlowError::Config(format!("Failed to initialize logging: {}", e)))
}
