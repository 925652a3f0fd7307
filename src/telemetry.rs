//! Logging setup for the binary
//!
//! The library only emits `tracing` events; this installs the subscriber
//! that prints them. Filter comes from `IOSTREAMS_LOG` (default `warn`).

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable holding the log filter directives
pub const LOG_ENV: &str = "IOSTREAMS_LOG";

const DEFAULT_FILTER: &str = "warn";

pub fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(io::stderr().is_terminal())
                .with_writer(io::stderr)
                .with_filter(log_filter()),
        )
        .try_init()
        .context("failed to install tracing subscriber")
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_error| EnvFilter::new(DEFAULT_FILTER))
}
