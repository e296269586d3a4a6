//! Configuration file support for chub-card-downloader.
//!
//! This module reads and writes the on-disk TOML document. Unlike
//! [`load_config`](super::load_config) it never looks at the environment, so
//! saving a user edit cannot persist a temporary override.
//!
//! # Configuration File Format
//!
//! ```toml
//! [settings]
//! bundle_option = "Folder"        # or "Zip"
//! output_directory = "/home/me/cards"
//! api_token = "your-urql-token"
//!
//! [api]
//! base_url = "https://api.chub.ai/api"
//! user_agent = "ChubCardDownloader/0.2.0"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{ApiConfig, LoggingConfig, Settings};

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Settings section
    #[serde(default)]
    pub settings: Settings,

    /// API section
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating its directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Load the file, writing a default one first if it does not exist yet.
    ///
    /// Sections or keys missing from an older file are filled with defaults.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigFileError> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(path)?;
        tracing::info!("Created default config file at {}", path.display());
        Ok(config)
    }

    /// Apply a user edit to the settings section and save the file.
    pub fn update_settings<F>(path: &Path, edit: F) -> Result<Self, ConfigFileError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut config = Self::load_or_create(path)?;
        edit(&mut config.settings);
        config.save(path)?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(config)
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BundleMode;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[settings]
bundle_option = "Zip"
output_directory = "/tmp/cards"
api_token = "test-token"

[logging]
level = "debug"
"#;
        std::fs::write(&path, toml_content).unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.settings.bundle_option, BundleMode::Zip);
        assert_eq!(
            config.settings.output_directory,
            Some(PathBuf::from("/tmp/cards"))
        );
        assert_eq!(config.settings.api_token.as_deref(), Some("test-token"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ConfigFile::default();
        config.settings.api_token = Some("saved-token".to_string());
        config.settings.bundle_option = BundleMode::Zip;

        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = ConfigFile::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_update_settings_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        ConfigFile::update_settings(&path, |s| {
            s.output_directory = Some(PathBuf::from("/data/cards"));
        })
        .unwrap();
        ConfigFile::update_settings(&path, |s| s.bundle_option = BundleMode::Zip).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(
            loaded.settings.output_directory,
            Some(PathBuf::from("/data/cards"))
        );
        assert_eq!(loaded.settings.bundle_option, BundleMode::Zip);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/config.toml");
        let result = ConfigFile::load(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = ConfigFile::load(&path);
        assert!(result.is_err());
    }
}
