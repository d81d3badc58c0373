//! Configuration loading

mod schema;

pub use schema::{Config, OrganizeRule, PatternKind};

use crate::error::ConfigError;
use crate::rules::RuleSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk syntax of a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Pick the syntax from the file extension (TOML unless `.yaml`/`.yml`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Toml,
        }
    }
}

impl Config {
    /// Read and parse a config file. Patterns are not checked here, see [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let format = ConfigFormat::from_path(path);
        debug!("Parsing {} as {:?}", path.display(), format);
        Self::parse(&content, format).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse config text in the given syntax
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    /// Check every rule and compile every pattern without touching any file
    pub fn validate(&self) -> crate::Result<()> {
        RuleSet::compile(self).map(|_| ())
    }

    /// Get the default config file path
    /// Uses the platform config directory (via dirs::config_dir), falling back to ~/.config
    pub fn default_path() -> Option<PathBuf> {
        let config_base =
            dirs::config_dir().or_else(|| dirs::home_dir().map(|d| d.join(".config")))?;
        Some(config_base.join("rulesort").join("config.toml"))
    }
}
