// src/logging.rs

//! Logging setup for `sitepipe` using `tracing` + `tracing-subscriber`.
//!
//! The filter directive is chosen in priority order:
//! 1. `--log-level` CLI flag (a bare level, applied globally)
//! 2. `SITEPIPE_LOG` environment variable, which accepts full `EnvFilter`
//!    syntax such as `sitepipe=debug,info`
//! 3. default to `info`

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup. An unparsable `SITEPIPE_LOG` directive is
/// an error rather than a silent fallback.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directive = filter_directive(cli_level, std::env::var("SITEPIPE_LOG").ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter directive '{directive}'"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

/// Pick the `EnvFilter` directive string: CLI flag wins, then the
/// environment variable, then `info`.
fn filter_directive(cli_level: Option<LogLevel>, env: Option<String>) -> String {
    if let Some(lvl) = cli_level {
        return level_directive(lvl).to_string();
    }
    match env {
        Some(dir) if !dir.trim().is_empty() => dir,
        _ => "info".to_string(),
    }
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
