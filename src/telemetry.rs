// src/telemetry.rs
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the process-wide fmt subscriber. `RUST_LOG` directives are
/// extended with `default_directives`.
pub fn init_tracing(default_directives: &[&str]) -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for directive in default_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
