use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,leadflow=debug";

pub fn filter_from_env() -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::new(DEFAULT_FILTER)
            .add_directive("hyper=warn".parse().context("invalid hyper directive")?)
            .add_directive("reqwest=warn".parse().context("invalid reqwest directive")?)),
    }
}

/// Installs the global fmt subscriber. Fails if one is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(filter_from_env()?)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
