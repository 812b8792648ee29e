//! Durable preferences and the Persistence Bridge.
//!
//! Preferences are a handful of scalars: whether the last pinned target is
//! remembered, the remembered bundle identifier, and two appearance settings
//! owned by the presentation layer. They are stored as one JSON document.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::AppHandle;

/// Default accent color (Aurora Blue).
pub const DEFAULT_ACCENT: &str = "#3B82F6";

/// Appearance mode for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the system setting.
    #[default]
    System,
}

impl ThemeMode {
    /// All modes in display order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Dark => "Dark",
            Self::System => "System",
        }
    }
}

/// Persisted preference scalars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Remember and restore the last pinned target.
    pub persistence_enabled: bool,
    /// Bundle identifier of the last pinned target.
    pub last_pinned_bundle_id: Option<String>,
    /// Accent color as `#RRGGBB`.
    pub accent_color: String,
    /// Appearance mode.
    pub theme_mode: ThemeMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            persistence_enabled: false,
            last_pinned_bundle_id: None,
            accent_color: DEFAULT_ACCENT.to_string(),
            theme_mode: ThemeMode::System,
        }
    }
}

/// Errors reading or writing the preference store.
#[derive(Error, Debug)]
pub enum PrefsError {
    /// Filesystem error.
    #[error("preferences I/O at {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Malformed document.
    #[error("preferences parse error at {path}: {source}")]
    Json {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key-value storage for [`Preferences`].
pub trait PrefStore: Send + Sync {
    /// Load preferences; a store that has never been written yields defaults.
    fn load(&self) -> Result<Preferences, PrefsError>;
    /// Persist preferences.
    fn store(&self, prefs: &Preferences) -> Result<(), PrefsError>;
}

/// In-memory store, used by tests and as a last resort when no home
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Stored document.
    prefs: Mutex<Preferences>,
    /// Number of `store` calls.
    writes: Mutex<usize>,
}

impl MemoryStore {
    /// Create a store holding `prefs`.
    pub fn new(prefs: Preferences) -> Self {
        Self {
            prefs: Mutex::new(prefs),
            writes: Mutex::new(0),
        }
    }

    /// Current stored document.
    pub fn snapshot(&self) -> Preferences {
        self.prefs.lock().clone()
    }

    /// Number of writes performed so far.
    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl PrefStore for MemoryStore {
    fn load(&self) -> Result<Preferences, PrefsError> {
        Ok(self.prefs.lock().clone())
    }

    fn store(&self, prefs: &Preferences) -> Result<(), PrefsError> {
        *self.prefs.lock() = prefs.clone();
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// JSON file store. Writes go to a sibling temp file and are renamed into
/// place so a crash never leaves a truncated document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Document location.
    path: PathBuf,
}

impl JsonFileStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Document location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wrap an I/O error with our path.
    fn io_err(&self, source: io::Error) -> PrefsError {
        PrefsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PrefStore for JsonFileStore {
    fn load(&self) -> Result<Preferences, PrefsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Preferences::default()),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&text).map_err(|source| PrefsError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&self, prefs: &Preferences) -> Result<(), PrefsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_err(e))?;
        }
        let text = serde_json::to_string_pretty(prefs).map_err(|source| PrefsError::Json {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_err(e))
    }
}

/// Preferred preferences location (`~/.topmost/prefs.json`).
pub fn default_prefs_path() -> PathBuf {
    let mut p = PathBuf::from(env::var_os("HOME").unwrap_or_default());
    p.push(".topmost");
    p.push("prefs.json");
    p
}

/// Records the last pinned target so it can be restored on next launch.
///
/// Saving and loading are gated by [`Preferences::persistence_enabled`];
/// clearing always applies. Store failures are logged and otherwise ignored:
/// the in-memory copy stays authoritative for the session.
pub struct PersistenceBridge {
    /// Backing store.
    store: Arc<dyn PrefStore>,
    /// In-memory copy of the stored document.
    prefs: Preferences,
}

impl PersistenceBridge {
    /// Load preferences from `store`, falling back to defaults on error.
    pub fn open(store: Arc<dyn PrefStore>) -> Self {
        let prefs = match store.load() {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!(error = %e, "failed to load preferences; using defaults");
                Preferences::default()
            }
        };
        Self { store, prefs }
    }

    /// Whether persistence is enabled.
    pub fn enabled(&self) -> bool {
        self.prefs.persistence_enabled
    }

    /// Enable or disable persistence. Disabling clears the stored identifier.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.prefs.persistence_enabled == enabled {
            return;
        }
        self.prefs.persistence_enabled = enabled;
        if !enabled {
            self.prefs.last_pinned_bundle_id = None;
        }
        info!(enabled, "persistence preference changed");
        self.flush();
    }

    /// Remember `app` as the last pinned target, if enabled and identifiable.
    pub fn save(&mut self, app: &AppHandle) {
        if !self.enabled() {
            return;
        }
        let Some(bundle_id) = app.bundle_id.as_ref() else {
            debug!(app = %app.name, "target has no bundle id; not persisted");
            return;
        };
        if self.prefs.last_pinned_bundle_id.as_ref() == Some(bundle_id) {
            return;
        }
        self.prefs.last_pinned_bundle_id = Some(bundle_id.clone());
        debug!(bundle_id = %bundle_id, "saved pinned target");
        self.flush();
    }

    /// Forget the stored identifier.
    pub fn clear(&mut self) {
        if self.prefs.last_pinned_bundle_id.take().is_some() {
            debug!("cleared pinned target");
            self.flush();
        }
    }

    /// Stored identifier, if persistence is enabled.
    pub fn load(&self) -> Option<&str> {
        if !self.enabled() {
            return None;
        }
        self.prefs.last_pinned_bundle_id.as_deref()
    }

    /// Full preference document.
    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// Mutate non-core preferences (appearance) and persist if changed.
    pub fn update(&mut self, f: impl FnOnce(&mut Preferences)) {
        let before = self.prefs.clone();
        f(&mut self.prefs);
        if self.prefs != before {
            self.flush();
        }
    }

    /// Write the in-memory document to the store.
    fn flush(&self) {
        if let Err(e) = self.store.store(&self.prefs) {
            warn!(error = %e, "failed to write preferences");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::handle;

    fn bridge(prefs: Preferences) -> (Arc<MemoryStore>, PersistenceBridge) {
        let store = Arc::new(MemoryStore::new(prefs));
        let bridge = PersistenceBridge::open(store.clone());
        (store, bridge)
    }

    fn enabled() -> Preferences {
        Preferences {
            persistence_enabled: true,
            ..Preferences::default()
        }
    }

    #[test]
    fn save_is_gated_by_preference() {
        let (store, mut b) = bridge(Preferences::default());
        b.save(&handle(3, "Notes", Some("com.apple.Notes")));
        assert_eq!(store.snapshot().last_pinned_bundle_id, None);
        assert_eq!(store.writes(), 0);

        let (store, mut b) = bridge(enabled());
        b.save(&handle(3, "Notes", Some("com.apple.Notes")));
        assert_eq!(
            store.snapshot().last_pinned_bundle_id.as_deref(),
            Some("com.apple.Notes")
        );
        assert_eq!(b.load(), Some("com.apple.Notes"));
    }

    #[test]
    fn apps_without_bundle_id_are_not_saved() {
        let (store, mut b) = bridge(enabled());
        b.save(&handle(3, "a.out", None));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn disabling_clears_identifier() {
        let (store, mut b) = bridge(Preferences {
            last_pinned_bundle_id: Some("com.apple.Notes".into()),
            ..enabled()
        });
        b.set_enabled(false);
        let snap = store.snapshot();
        assert!(!snap.persistence_enabled);
        assert_eq!(snap.last_pinned_bundle_id, None);
        assert_eq!(b.load(), None);
    }

    #[test]
    fn clear_without_identifier_does_not_write() {
        let (store, mut b) = bridge(enabled());
        b.clear();
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn update_persists_only_changes() {
        let (store, mut b) = bridge(Preferences::default());
        b.update(|p| p.theme_mode = ThemeMode::System);
        assert_eq!(store.writes(), 0);
        b.update(|p| p.theme_mode = ThemeMode::Dark);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.snapshot().theme_mode, ThemeMode::Dark);
    }

    #[test]
    fn json_store_round_trips_and_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("prefs.json"));
        assert_eq!(store.load().unwrap(), Preferences::default());

        let prefs = Preferences {
            persistence_enabled: true,
            last_pinned_bundle_id: Some("com.apple.Safari".into()),
            accent_color: "#10B981".into(),
            theme_mode: ThemeMode::Light,
        };
        store.store(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn json_store_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{ "persistence_enabled": true }"#).unwrap();
        let prefs = JsonFileStore::new(&path).load().unwrap();
        assert!(prefs.persistence_enabled);
        assert_eq!(prefs.accent_color, DEFAULT_ACCENT);
    }

    #[test]
    fn json_store_reports_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(PrefsError::Json { .. })
        ));
    }
}
