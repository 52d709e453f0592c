//! Application configuration management.
//!
//! Settings that rarely change between runs live in a JSON file in the
//! platform configuration directory; command-line flags override them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::duplicates::FinderConfig;
use crate::scanner::PREHASH_SIZE;

/// Errors loading the configuration file.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("failed to determine the configuration directory")]
    NoConfigDir,

    /// The file could not be read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Configuration file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// Configuration file
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of leading bytes hashed before a full comparison.
    pub prehash_size: usize,
    /// Confirm matches byte by byte instead of by full hash.
    pub paranoid: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prehash_size: PREHASH_SIZE,
            paranoid: false,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Falls back to defaults if the file is missing or unusable.
    pub fn load() -> Self {
        match Self::config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load the configuration from `path`; a missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid JSON, or holds an
    /// out-of-range value.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero prehash size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prehash_size == 0 {
            return Err(ConfigError::Invalid(
                "prehash_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_paranoid_override(mut self, paranoid: bool) -> Self {
        self.paranoid |= paranoid;
        self
    }

    /// Duplicate finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_prehash_size(self.prehash_size)
            .with_paranoid(self.paranoid)
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("com", "dupestash", "dupestash").ok_or(ConfigError::NoConfigDir)?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}
