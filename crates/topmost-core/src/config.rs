//! Runtime configuration loaded from an optional RON file.
//!
//! ```ron
//! (
//!     enforce_interval_ms: 500,
//!     shortcut: "cmd+shift+KeyP",
//! )
//! ```
//!
//! Every field is optional; omitted fields take their defaults.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use ron::{Options, error::SpannedError, extensions::Extensions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors produced while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config at {path}: {source}")]
    Read {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid RON for [`Config`].
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Parser error with position.
        #[source]
        source: SpannedError,
    },
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for enforcement, notifications and the global shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Enforcement tick period while pinned.
    pub enforce_interval_ms: u64,
    /// Minimum spacing between fallback activations.
    pub fallback_throttle_ms: u64,
    /// How long the pin/unpin notification stays on screen.
    pub notification_ms: u64,
    /// Period of the background running-app refresh.
    pub registry_refresh_ms: u64,
    /// Re-write position and size after raising to force a redraw.
    pub reapply_geometry: bool,
    /// Global shortcut, e.g. `"cmd+shift+KeyP"`.
    pub shortcut: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enforce_interval_ms: 500,
            fallback_throttle_ms: 1000,
            notification_ms: 1500,
            registry_refresh_ms: 3000,
            reapply_geometry: true,
            shortcut: "cmd+shift+KeyP".to_string(),
        }
    }
}

impl Config {
    /// Parse a RON document and validate it.
    pub fn from_ron(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let options = Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        let cfg: Self = options
            .from_str(text)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would busy-loop or disable a required feature.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("enforce_interval_ms", self.enforce_interval_ms),
            ("fallback_throttle_ms", self.fallback_throttle_ms),
            ("notification_ms", self.notification_ms),
            ("registry_refresh_ms", self.registry_refresh_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }
        if self.shortcut.trim().is_empty() {
            return Err(ConfigError::Invalid("shortcut must not be empty".into()));
        }
        Ok(())
    }

    /// Enforcement tick period.
    pub fn enforce_interval(&self) -> Duration {
        Duration::from_millis(self.enforce_interval_ms)
    }

    /// Fallback throttle interval.
    pub fn fallback_throttle(&self) -> Duration {
        Duration::from_millis(self.fallback_throttle_ms)
    }

    /// Notification lifetime.
    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    /// Background registry refresh period.
    pub fn registry_refresh(&self) -> Duration {
        Duration::from_millis(self.registry_refresh_ms)
    }
}

/// Preferred config location (`~/.topmost/config.ron`).
pub fn default_config_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".topmost");
    p.push("config.ron");
    p
}

/// Load the configuration.
///
/// An explicit path must exist. Without one, `~/.topmost/config.ron` is used
/// when present and defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let preferred = default_config_path();
            if !preferred.exists() {
                debug!(path = %preferred.display(), "no config file; using defaults");
                return Ok(Config::default());
            }
            preferred
        }
    };
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    Config::from_ron(&text, &path)
}
