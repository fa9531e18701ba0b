//! YAML configuration for the lookup engine.
//!
//! One file configures the matcher defaults and the record store:
//!
//! ```yaml
//! version: "1"
//! name: "back office"
//!
//! matcher:
//!   default_threshold: 50
//!   accept_mode: all        # all | any
//!
//! store:
//!   prefilter: substring    # substring | full_scan
//!   seed_path: "data/seed.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use matcher::{AcceptMode, MatcherConfig};
use serde::{Deserialize, Serialize};
use store::{PrefilterMode, StoreConfig};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub matcher: MatcherYamlConfig,

    #[serde(default)]
    pub store: StoreYamlConfig,
}

impl LookupConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: LookupConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1" | "1.0" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;
        self.matcher.validate()?;
        self.store.validate()?;
        Ok(())
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            default_threshold: self.matcher.default_threshold,
            accept_mode: self.matcher.accept_mode,
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new().with_prefilter(self.store.prefilter)
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            name: None,
            matcher: MatcherYamlConfig::default(),
            store: StoreYamlConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatcherYamlConfig {
    /// Applied when a query carries no `match_threshold`.
    #[serde(default = "default_threshold")]
    pub default_threshold: u8,

    #[serde(default)]
    pub accept_mode: AcceptMode,
}

impl MatcherYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.default_threshold > 100 {
            return Err(ConfigLoadError::Validation(format!(
                "matcher.default_threshold must be <= 100, got {}",
                self.default_threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatcherYamlConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            accept_mode: AcceptMode::All,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreYamlConfig {
    #[serde(default)]
    pub prefilter: PrefilterMode,

    /// JSON seed loaded into the in-memory store at startup.
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl StoreYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if let Some(path) = &self.seed_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigLoadError::Validation(
                    "store.seed_path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn default_threshold() -> u8 {
    50
}
