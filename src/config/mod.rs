//! Configuration management for jobharvest.
//!
//! Configuration is read from `~/.config/jobharvest/config.toml` (or the path
//! given with `--config`). If the default file doesn't exist, one is written
//! out with every default filled in. Any table or key left out of the file
//! falls back to the built-in value for that source.

pub mod credentials;
pub mod delay;

pub use credentials::Credentials;
pub use delay::DelayRange;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::browser::BrowserSettings;
use crate::domain::Source;
use crate::scraper::SourceSettings;

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub browser: BrowserSettings,
    pub indeed: SourceSettings,
    pub linkedin: SourceSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("job_listings.db"),
            browser: BrowserSettings::default(),
            indeed: SourceSettings::indeed(),
            linkedin: SourceSettings::linkedin(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default path is created with the
    /// built-in values when missing.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    /// Parse a (possibly partial) TOML document on top of the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let overrides: toml::Table = toml::from_str(content)?;
        let defaults = toml::Value::try_from(Self::default())
            .map_err(|e| <toml::de::Error as serde::de::Error>::custom(e.to_string()))?;
        let toml::Value::Table(mut merged) = defaults else {
            return Err(serde::de::Error::custom("defaults did not render as a table"));
        };
        merge_tables(&mut merged, overrides);
        toml::Value::Table(merged).try_into()
    }

    /// Get the default config file path: `~/.config/jobharvest/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("jobharvest").join("config.toml"))
    }

    pub fn source(&self, source: Source) -> &SourceSettings {
        match source {
            Source::Indeed => &self.indeed,
            Source::LinkedIn => &self.linkedin,
        }
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = Self::default_config_content()?;
        fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The default config file, with a short header explaining the format.
    fn default_config_content() -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(format!(
            "# jobharvest configuration\n\
             #\n\
             # Delays are ranges in milliseconds: a value is drawn uniformly from\n\
             # [min_ms, max_ms] each time. Retry delays grow as\n\
             # base_delay_ms * factor^attempt.\n\
             #\n\
             # LinkedIn credentials are read from LINKEDIN_USERNAME and\n\
             # LINKEDIN_PASSWORD (a .env file in the working directory works too).\n\n\
             {}",
            body
        ))
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to render default config: {0}")]
    Serialize(String),
}
