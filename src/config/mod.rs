//! Configuration management.
//!
//! Settings live in a TOML file (see [`file_config`]) and can be overridden
//! per process with `CHUB_CARD_<SECTION>__<KEY>` environment variables, e.g.
//! `CHUB_CARD_SETTINGS__API_TOKEN`. The resulting [`Config`] is read once at
//! the start of an operation and handed to it explicitly.

pub mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::sources::CHUB_API_BASE;
use crate::utils::DEFAULT_USER_AGENT;

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "chub-card-downloader";

/// Config file looked up in the working directory before the platform one
pub const LOCAL_CONFIG_FILE: &str = "chub-card-downloader.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "CHUB_CARD";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User-editable settings
    #[serde(default)]
    pub settings: Settings,

    /// API endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            settings: file.settings,
            api: file.api,
            logging: file.logging,
        }
    }
}

/// How the downloaded files are left on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleMode {
    /// Keep the loose folder
    #[default]
    Folder,

    /// Compress the folder into `<folder>.zip` and remove it
    Zip,
}

impl fmt::Display for BundleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleMode::Folder => write!(f, "Folder"),
            BundleMode::Zip => write!(f, "Zip"),
        }
    }
}

/// Settings the user edits: bundle mode, output directory and API token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bundle_option: BundleMode,

    #[serde(default)]
    pub output_directory: Option<PathBuf>,

    /// Chub.ai `URQL_TOKEN`, needed for private and NSFL cards
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Settings {
    /// Output directory, if one is set and not blank
    pub fn output_directory(&self) -> Option<&Path> {
        self.output_directory
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// API token, if one is set and not blank
    pub fn api_token(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// API endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    CHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load configuration from a file, layering environment overrides on top.
///
/// A missing file is not an error; defaults apply.
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Platform config file location, e.g. `~/.config/chub-card-downloader/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("config.toml")
}

/// Find an existing config file: the working directory first, then the
/// platform config directory.
pub fn find_config_file() -> Option<PathBuf> {
    [PathBuf::from(LOCAL_CONFIG_FILE), default_config_path()]
        .into_iter()
        .find(|path| path.is_file())
}
