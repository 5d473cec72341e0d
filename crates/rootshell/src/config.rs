//! Runtime configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shell configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of managed views (0 = unlimited)
    pub max_views: usize,

    /// Maximum number of popups per view (0 = unlimited)
    pub max_popups_per_view: usize,

    /// Ping new toplevels
    pub ping_on_create: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_views: 0,
            max_popups_per_view: 0,
            ping_on_create: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("rootshell/config.toml")),
            Some(std::path::PathBuf::from("/etc/rootshell/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::info!(?path, ?config, "loaded configuration");
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(?path, error = %e, "failed to load config");
                    }
                }
            }
        }

        tracing::info!("using default configuration");
        Self::default()
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Whether one more view fits, given how many exist
    pub fn view_capacity_left(&self, views: usize) -> bool {
        self.max_views == 0 || views < self.max_views
    }

    /// Whether one more popup fits on a view, given how many it has
    pub fn popup_capacity_left(&self, popups: usize) -> bool {
        self.max_popups_per_view == 0 || popups < self.max_popups_per_view
    }
}

/// Helper for getting XDG directories
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    }
}
