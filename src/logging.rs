// src/logging.rs

//! `tracing` subscriber setup for the binary.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `HYBRID_DAG_LOG`, which accepts full `EnvFilter` directives such as
//!    `hybrid_dag::exec=debug,info`
//! 3. `info`
//!
//! Output goes to stderr; stdout is reserved for node results.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "HYBRID_DAG_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directives = resolve_directives(cli_level, env_value.as_deref());
    let filter = EnvFilter::try_new(directives)
        .with_context(|| format!("invalid log filter in {LOG_ENV_VAR}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn resolve_directives(cli_level: Option<LogLevel>, env_value: Option<&str>) -> &str {
    if let Some(level) = cli_level {
        return level.as_directive();
    }
    match env_value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => DEFAULT_DIRECTIVES,
    }
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_env() {
        assert_eq!(
            resolve_directives(Some(LogLevel::Trace), Some("error")),
            "trace"
        );
    }

    #[test]
    fn env_directives_pass_through() {
        assert_eq!(
            resolve_directives(None, Some(" hybrid_dag::exec=debug,warn ")),
            "hybrid_dag::exec=debug,warn"
        );
        assert!(EnvFilter::try_new("hybrid_dag::exec=debug,warn").is_ok());
    }

    #[test]
    fn blank_or_missing_env_means_info() {
        assert_eq!(resolve_directives(None, Some("   ")), "info");
        assert_eq!(resolve_directives(None, None), "info");
    }
}
