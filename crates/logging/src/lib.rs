//! Shared logging helpers and CLI argument definitions for the topmost workspace.
//!
//! The binary flattens [`LogArgs`] into its CLI, turns the flags into a filter
//! spec with [`LogArgs::spec`], and installs a `tracing_subscriber` registry
//! with [`env_filter_from_spec`].

use std::env;

use clap::Args;
use tracing_subscriber::EnvFilter;

/// Logging controls for CLI apps.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Set global log level to trace (our crates only)
    #[arg(long, conflicts_with_all = ["debug", "log_level", "log_filter"])]
    pub trace: bool,

    /// Set global log level to debug (our crates only)
    #[arg(long, conflicts_with_all = ["trace", "log_level", "log_filter"])]
    pub debug: bool,

    /// Set a single global log level for our crates (error|warn|info|debug|trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Set an explicit tracing filter directive (overrides other flags)
    /// e.g. "topmost_core=trace,mac_winops=debug"
    #[arg(long)]
    pub log_filter: Option<String>,
}

impl LogArgs {
    /// Filter spec for these flags, consulting `RUST_LOG` when none are set.
    pub fn spec(&self) -> String {
        compute_spec(
            self.trace,
            self.debug,
            self.log_level.as_deref(),
            self.log_filter.as_deref(),
        )
    }
}

/// List of crate targets that constitute "our" logs.
pub fn our_crates() -> &'static [&'static str] {
    &[
        "topmost",
        "topmost_core",
        "mac_winops",
        "permissions",
        "logging",
    ]
}

/// Build a filter directive string that sets the same `level` for all of our crates.
pub fn level_spec_for(level: &str) -> String {
    let lvl = level.to_ascii_lowercase();
    our_crates()
        .iter()
        .map(|t| format!("{}={}", t, lvl))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compute the final filter spec string with precedence:
/// - `log_filter`
/// - `trace`/`debug`/`log_level` (crate-scoped)
/// - `RUST_LOG` env
/// - default to crate-scoped `info`
pub fn compute_spec(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
) -> String {
    spec_with_env(
        trace,
        debug,
        log_level,
        log_filter,
        env::var("RUST_LOG").ok(),
    )
}

/// [`compute_spec`] with the environment value passed in.
fn spec_with_env(
    trace: bool,
    debug: bool,
    log_level: Option<&str>,
    log_filter: Option<&str>,
    rust_log: Option<String>,
) -> String {
    if let Some(spec) = log_filter {
        return spec.to_string();
    }
    if trace {
        return level_spec_for("trace");
    }
    if debug {
        return level_spec_for("debug");
    }
    if let Some(lvl) = log_level {
        return level_spec_for(lvl);
    }
    rust_log.unwrap_or_else(|| level_spec_for("info"))
}

/// Create an `EnvFilter` from a spec string.
pub fn env_filter_from_spec(spec: &str) -> EnvFilter {
    EnvFilter::new(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let spec = spec_with_env(true, false, None, Some("topmost=warn"), None);
        assert_eq!(spec, "topmost=warn");
    }

    #[test]
    fn flags_scope_to_our_crates() {
        let spec = spec_with_env(false, true, None, None, Some("trace".into()));
        assert!(spec.contains("topmost_core=debug"));
        assert!(spec.contains("mac_winops=debug"));
        assert!(!spec.contains("trace"));
    }

    #[test]
    fn level_is_lowercased() {
        let spec = spec_with_env(false, false, Some("WARN"), None, None);
        assert!(spec.split(',').all(|part| part.ends_with("=warn")));
    }

    #[test]
    fn env_then_default() {
        assert_eq!(
            spec_with_env(false, false, None, None, Some("info".into())),
            "info"
        );
        assert_eq!(
            spec_with_env(false, false, None, None, None),
            level_spec_for("info")
        );
    }
}
