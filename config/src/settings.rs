//! Engine settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine settings path")]
    NoPath,

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings stored in settings.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Largest positional count probed when deciding whether a command
    /// still takes arguments
    pub arity_probe_limit: usize,
    /// Cap on concurrently running background fetches (unbounded when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight_fetches: Option<usize>,
    /// Command tree description to load when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_tree: Option<PathBuf>,
    /// Tracing filter directive used when RUST_LOG is unset (e.g. "info,commands=debug")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arity_probe_limit: 20,
            max_in_flight_fetches: None,
            command_tree: None,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        Self::load_from(&path).unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = PathManager::settings_path().ok_or(SettingsError::NoPath)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Command tree file: the configured one, else the default location
    pub fn command_tree_path(&self) -> Option<PathBuf> {
        self.command_tree.clone().or_else(PathManager::command_tree_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = toml::from_str("max_in_flight_fetches = 4").unwrap();
        assert_eq!(settings.arity_probe_limit, 20);
        assert_eq!(settings.max_in_flight_fetches, Some(4));
        assert_eq!(settings.command_tree, None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let settings = Settings {
            arity_probe_limit: 8,
            log_filter: Some("debug".into()),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "arity_probe_limit = \"many\"").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Parse { .. })));
    }
}
