//! Log subscriber setup for the binary

use std::io::{stderr, IsTerminal};

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init_logger(json: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    if json {
        let layer = fmt::layer()
            .json()
            .with_writer(stderr)
            .with_target(true)
            .flatten_event(true)
            .with_filter(env_filter);
        registry()
            .with(layer)
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {}", e))
    } else {
        let layer = fmt::layer()
            .with_writer(stderr)
            .with_ansi(stderr().is_terminal())
            .with_target(false)
            .compact()
            .with_filter(env_filter);
        registry()
            .with(layer)
            .try_init()
            .map_err(|e| anyhow!("failed to install logger: {}", e))
    }
}
