//! Diagnostic logging setup
//!
//! Logs go to stderr so stdout stays reserved for rendered output.
//! `RUST_LOG` overrides the level derived from `--verbose` / `--quiet`.

use crate::output::Verbosity;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "warn,depsync=debug",
    }
}

/// Install the global tracing subscriber
///
/// Calling this more than once is an error from `try_init`, which callers
/// may ignore.
pub fn init(verbosity: Verbosity) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
