//! Tab-selection shell state.
//!
//! The shell remembers which table is active between runs in a small JSON
//! state file. A missing, unreadable or stale file falls back to the
//! default tab.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tablesync_schema::{Catalog, CatalogEntry, DEFAULT_TAB};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised by the shell.
#[derive(Error, Debug)]
pub enum ShellError {
    /// No table with this tab id or resource name.
    #[error("unknown tab `{0}`")]
    UnknownTab(String),

    /// State file could not be written.
    #[error("failed to write {path}: {source}")]
    Persist {
        /// State file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// State could not be encoded.
    #[error("failed to encode shell state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted shell settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellSettings {
    /// Tab id of the active table.
    pub active_tab: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            active_tab: DEFAULT_TAB.to_string(),
        }
    }
}

impl ShellSettings {
    /// Reads settings from `path`, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<ShellSettings>(&text) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring unreadable shell state");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable shell state");
                Self::default()
            }
        }
    }

    /// Writes settings to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ShellError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ShellError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The table catalog plus the persisted active tab.
pub struct Shell {
    catalog: Catalog,
    state_path: PathBuf,
    settings: ShellSettings,
}

impl Shell {
    /// Opens the shell, restoring the active tab from `state_path`.
    ///
    /// A stored tab that is not in the catalog is replaced by the default.
    pub fn open(catalog: Catalog, state_path: impl Into<PathBuf>) -> Self {
        let state_path = state_path.into();
        let mut settings = ShellSettings::load(&state_path);
        if catalog.lookup(&settings.active_tab).is_none() {
            warn!(tab = %settings.active_tab, "stored tab is unknown, using default");
            settings = ShellSettings::default();
        }
        debug!(tab = %settings.active_tab, "shell opened");
        Self {
            catalog,
            state_path,
            settings,
        }
    }

    /// The catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Tab id of the active table.
    pub fn active_tab(&self) -> &str {
        &self.settings.active_tab
    }

    /// Activates a tab and persists the choice.
    ///
    /// Accepts a tab id or a resource name; the tab id is stored.
    pub fn select(&mut self, name: &str) -> Result<&CatalogEntry, ShellError> {
        let tab = self
            .catalog
            .lookup(name)
            .ok_or_else(|| ShellError::UnknownTab(name.to_string()))?
            .tab
            .clone();

        if tab != self.settings.active_tab {
            let settings = ShellSettings {
                active_tab: tab.clone(),
            };
            settings.save(&self.state_path)?;
            self.settings = settings;
            debug!(%tab, path = %self.state_path.display(), "active tab persisted");
        }
        self.resolve(Some(&tab))
    }

    /// The named table, or the active one when `name` is `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<&CatalogEntry, ShellError> {
        let name = name.unwrap_or(self.settings.active_tab.as_str());
        self.catalog
            .lookup(name)
            .ok_or_else(|| ShellError::UnknownTab(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn missing_state_defaults_to_doctors() {
        let dir = TempDir::new().unwrap();
        let shell = Shell::open(catalog(), dir.path().join("state.json"));
        assert_eq!(shell.active_tab(), "doctors");
        assert_eq!(shell.resolve(None).unwrap().schema.resource(), "doctors");
    }

    #[test]
    fn selection_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut shell = Shell::open(catalog(), &path);
        let entry = shell.select("patient-diseases").unwrap();
        assert_eq!(entry.tab, "patientDiseases");

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"activeTab\": \"patientDiseases\""));

        let reopened = Shell::open(catalog(), &path);
        assert_eq!(reopened.active_tab(), "patientDiseases");
    }

    #[test]
    fn unknown_tab_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let mut shell = Shell::open(catalog(), &path);

        assert!(matches!(shell.select("planets"), Err(ShellError::UnknownTab(_))));
        assert_eq!(shell.active_tab(), "doctors");
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_or_stale_state_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Shell::open(catalog(), &path).active_tab(), "doctors");

        fs::write(&path, r#"{"activeTab":"planets"}"#).unwrap();
        assert_eq!(Shell::open(catalog(), &path).active_tab(), "doctors");
    }

    #[test]
    fn unwritable_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("state.json");
        let mut shell = Shell::open(catalog(), &path);

        assert!(matches!(
            shell.select("countries"),
            Err(ShellError::Persist { .. })
        ));
        assert_eq!(shell.active_tab(), "doctors");
    }
}
