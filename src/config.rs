use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default address of the HTTP surface
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Tools configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolsConfig {
    /// Root of the downloaded package tree, `<data dir>/packages` when unset
    pub packages_dir: Option<PathBuf>,
    /// Socket address the HTTP surface binds to
    pub listen: String,
    /// Framework short names used for precedence lists, built-in list when unset
    pub frameworks: Option<Vec<String>>,
    pub log: LogConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            packages_dir: None,
            listen: DEFAULT_LISTEN.to_string(),
            frameworks: None,
            log: LogConfig::default(),
        }
    }
}

/// Logging-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is not set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Also write to the log file in the data directory
    pub file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
            file: true,
        }
    }
}

impl ToolsConfig {
    /// Reads the config file at `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The configured packages directory, or the default one
    pub fn packages_dir(&self) -> PathBuf {
        self.packages_dir.clone().unwrap_or_else(packages_dir)
    }
}

/// Returns the path to the data directory for nuget-tools.
/// Uses $XDG_DATA_HOME/nuget-tools if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/nuget-tools,
/// or ./nuget-tools if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default root of the package tree.
pub fn packages_dir() -> PathBuf {
    data_dir().join("packages")
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("nuget-tools.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("nuget-tools")
}
