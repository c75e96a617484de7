//! Structured logging setup
//!
//! Diagnostics go through `tracing` to stderr. The colored, human-oriented
//! summary lines printed by the CLI are separate and unaffected by the level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable that overrides the CLI-derived filter
pub const LOG_ENV: &str = "VARREDOR_LOG";

/// Pick the filter directive for the given CLI flags.
///
/// An explicit `--log-level` wins over `--verbose`. Bare levels are scoped to
/// this crate so dependencies stay quiet.
pub fn directive(verbose: bool, log_level: Option<&str>) -> String {
    match (verbose, log_level) {
        (_, Some(level)) if level.contains('=') => level.to_string(),
        (_, Some(level)) => format!("varredor={}", level),
        (true, None) => "varredor=debug".to_string(),
        (false, None) => "varredor=warn".to_string(),
    }
}

/// Initialize the global subscriber
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(directive(verbose, log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
