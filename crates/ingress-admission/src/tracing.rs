use anyhow::{anyhow, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const SILENCED_DEPENDENCIES: &[&str] = &["h2", "hyper", "rustls", "tower"];

fn filter_layer(log_level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(log_level)
        .map_err(|e| anyhow!("invalid log level {}: {}", log_level, e))?;
    // these dependencies generate trace events too, but we don't care about them
    for dependency in SILENCED_DEPENDENCIES {
        filter = filter.add_directive(format!("{dependency}=off").parse()?);
    }
    Ok(filter)
}

/// Install the global subscriber, this can be done only once per process.
pub fn setup_tracing(log_level: &str, log_fmt: &str, log_no_color: bool) -> Result<()> {
    let filter_layer = filter_layer(log_level)?;

    match log_fmt {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().json())
            .try_init()?,
        "text" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_ansi(!log_no_color))
            .try_init()?,
        _ => return Err(anyhow!("Unknown log message format: {}", log_fmt)),
    };

    Ok(())
}
